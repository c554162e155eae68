//! End-to-end placement, instantiation, module and virtual chassis scenarios
//! run against the in-memory store.

use dcim_core::test_utils::Fixture;
use dcim_core::{DcimError, ModuleInstallOptions, available_units};
use dcim_models::*;
use dcim_store::{ComponentFilter, DcimStore, DeviceFilter, ModuleScope};
use std::collections::{BTreeSet, HashSet};

/// Placed devices as (half-unit slot, face) pairs, computed independently of
/// the rack unit space
fn occupied(placed: &[(u32, Units, RackFace, bool)]) -> HashSet<(u32, RackFace)> {
    let mut pairs = HashSet::new();
    for (position, height, face, full_depth) in placed {
        let start = position * 2;
        for slot in start..start + height.half_units_ceil() {
            if *full_depth {
                pairs.insert((slot, RackFace::Front));
                pairs.insert((slot, RackFace::Rear));
            } else {
                pairs.insert((slot, *face));
            }
        }
    }
    pairs
}

#[tokio::test]
async fn available_units_matches_brute_force() {
    let fx = Fixture::new();
    let rack = fx.rack(12);
    let full_2u = fx.device_type("full 2U", Units::whole(2), true);
    let half_1u = fx.device_type("half 1U", Units::ONE, false);
    let half_3u = fx.device_type("half 3U", Units::whole(3), false);

    let layout = [
        (&full_2u, 1, RackFace::Front),
        (&half_1u, 5, RackFace::Front),
        (&half_1u, 6, RackFace::Rear),
        (&half_3u, 9, RackFace::Rear),
    ];
    let mut placed = Vec::new();
    for (dt, position, face) in layout {
        fx.racked_device(dt, &rack, position, face);
        placed.push((position, dt.u_height, face, dt.is_full_depth));
    }
    let taken = occupied(&placed);
    let slot_end = rack.slot_end();

    for height in [Units::HALF, Units::ONE, Units::whole(2), Units::whole(4)] {
        for face in [Some(RackFace::Front), Some(RackFace::Rear), None] {
            let returned: BTreeSet<u32> = available_units(&fx.store, &rack, height, face, &[])
                .await
                .unwrap()
                .into_iter()
                .map(Units::half_units_floor)
                .collect();
            let faces: Vec<RackFace> = match face {
                Some(face) => vec![face],
                None => vec![RackFace::Front, RackFace::Rear],
            };
            for start in 2..slot_end {
                let end = start + height.half_units_ceil();
                let collides = end > slot_end
                    || (start..end).any(|slot| faces.iter().any(|f| taken.contains(&(slot, *f))));
                assert_eq!(
                    returned.contains(&start),
                    !collides,
                    "height {} face {:?} slot {}",
                    height,
                    face,
                    start
                );
            }

            // Same inputs, same answer
            let again: BTreeSet<u32> = available_units(&fx.store, &rack, height, face, &[])
                .await
                .unwrap()
                .into_iter()
                .map(Units::half_units_floor)
                .collect();
            assert_eq!(returned, again);
        }
    }
}

#[tokio::test]
async fn full_depth_device_at_the_top_of_a_42u_rack() {
    let fx = Fixture::new();
    let service = fx.service();
    let rack = fx.rack(42);
    let type_a = fx.device_type("A", Units::whole(2), true);
    let type_b = fx.device_type("B", Units::whole(2), true);
    let half = fx.device_type("half", Units::ONE, false);

    let place = |dt: &DeviceType, position: u32, face: RackFace| {
        let mut device = Device::new(dt.id.unwrap(), 1, rack.site_id);
        device.rack_id = Some(rack.id);
        device.position = Some(Units::whole(position));
        device.face = Some(face);
        device
    };

    let first = service.create_device(place(&type_a, 40, RackFace::Front)).await.unwrap();

    let err = service.create_device(place(&type_b, 41, RackFace::Front)).await.unwrap_err();
    match &err {
        DcimError::PlacementConflict(errors) => {
            assert_eq!(errors.get("position")[0].objects, vec![first.id.unwrap()]);
        }
        other => panic!("expected placement conflict, got {:?}", other),
    }

    // Unit 41 is full depth occupied, so its rear is taken too
    let err = service.create_device(place(&half, 41, RackFace::Rear)).await.unwrap_err();
    assert!(matches!(err, DcimError::PlacementConflict(_)), "got {:?}", err);

    // Half-depth devices share a unit front and back
    service.create_device(place(&half, 10, RackFace::Front)).await.unwrap();
    service.create_device(place(&half, 10, RackFace::Rear)).await.unwrap();

    let racked = fx.store.query_devices(&DeviceFilter::in_rack(rack.id)).await.unwrap();
    assert_eq!(racked.len(), 3);
}

#[tokio::test]
async fn device_type_resize_against_placed_instances() {
    let fx = Fixture::new();
    let service = fx.service();
    let rack = fx.rack(12);
    let dt = fx.device_type("growing", Units::ONE, true);
    let instance = fx.racked_device(&dt, &rack, 10, RackFace::Front);

    let mut taller = dt.clone();
    taller.u_height = Units::whole(3);
    let saved = service.update_device_type(taller.clone()).await.unwrap();
    assert_eq!(saved.u_height, Units::whole(3));

    // Back to 1U, then put something in unit 12 and grow again
    service.update_device_type(dt.clone()).await.unwrap();
    let other = fx.device_type("other", Units::ONE, true);
    let blocker = fx.racked_device(&other, &rack, 12, RackFace::Front);

    match service.update_device_type(taller).await.unwrap_err() {
        DcimError::StructuralInvariantViolation { message, objects } => {
            assert!(message.contains(&instance.identifier()), "{}", message);
            assert_eq!(objects, vec![instance.id.unwrap(), blocker.id.unwrap()]);
        }
        other => panic!("expected structural violation, got {:?}", other),
    }
}

#[tokio::test]
async fn created_components_match_expanded_templates() {
    let fx = Fixture::new();
    let dt = fx.device_type("spine", Units::whole(2), true);
    let owner = TemplateOwner::DeviceType(dt.id.unwrap());
    fx.template(owner, "mgmt0", TemplateKind::Interface(InterfaceTemplateData::default()));
    fx.template(owner, "Ethernet[1-2]/[1-4]", TemplateKind::Interface(InterfaceTemplateData::default()));
    fx.template(owner, "PSU[A,B]", TemplateKind::PowerPort(PowerPortData::default()));
    fx.template(owner, "Fan [01-03]", TemplateKind::InventoryItem(InventoryItemTemplateData::default()));

    let device = fx
        .service()
        .create_device(Device::new(dt.id.unwrap(), 1, fx.site.id))
        .await
        .unwrap();
    let components = fx
        .store
        .query_components(&ComponentFilter::of_device(device.id.unwrap()))
        .await
        .unwrap();

    let names: BTreeSet<&str> = components.iter().map(|c| c.name.as_str()).collect();
    let mut expected: BTreeSet<&str> = [
        "mgmt0", "PSUA", "PSUB", "Fan 01", "Fan 02", "Fan 03",
    ]
    .into_iter()
    .collect();
    let ethernet: Vec<String> = (1..=2)
        .flat_map(|slot| (1..=4).map(move |port| format!("Ethernet{}/{}", slot, port)))
        .collect();
    expected.extend(ethernet.iter().map(String::as_str));
    assert_eq!(names, expected);
    assert_eq!(components.len(), expected.len());
    assert!(components.iter().all(|c| c.module_id.is_none()));
}

#[tokio::test]
async fn module_adoption_keeps_names_unique() {
    let fx = Fixture::new();
    let dt = fx.device_type("chassis", Units::whole(4), true);
    let device = fx.device(&dt);
    let bay = fx.module_bay(&device, "PEM 0", "0");
    let pem = fx.module_type("PEM");
    let owner = TemplateOwner::ModuleType(pem.id);
    fx.template(owner, "PEM{module} PSU", TemplateKind::PowerPort(PowerPortData::default()));
    fx.template(owner, "PEM{module} console", TemplateKind::ConsolePort(PortData::default()));
    let orphans = [
        fx.component(&device, None, "PEM0 PSU", ComponentData::PowerPort(PowerPortData::default())),
        fx.component(&device, None, "PEM0 console", ComponentData::ConsolePort(PortData::default())),
    ];

    let installed = fx
        .service()
        .create_module(
            Module {
                id: None,
                device_id: device.id.unwrap(),
                module_bay_id: bay.id.unwrap(),
                module_type_id: pem.id,
                status: ModuleStatus::Active,
                serial: String::new(),
                asset_tag: None,
            },
            ModuleInstallOptions {
                replicate_components: true,
                adopt_components: true,
            },
        )
        .await
        .unwrap();
    let module_id = installed.module.id.unwrap();
    assert!(installed.report.created.is_empty());

    for orphan in &orphans {
        let stored = fx.store.get_component(orphan.id.unwrap()).await.unwrap();
        assert_eq!(stored.module_id, Some(module_id), "{}", orphan.name);
    }
    let owned = fx
        .store
        .query_components(&ComponentFilter::of_device(device.id.unwrap()).module(ModuleScope::Module(module_id)))
        .await
        .unwrap();
    assert_eq!(owned.len(), 2);
}

#[tokio::test]
async fn virtual_chassis_delete_blocked_by_cross_chassis_lag() {
    let fx = Fixture::new();
    let service = fx.service();
    let dt = fx.device_type("QFX5120", Units::ONE, true);
    let vc = fx.virtual_chassis("fabric", None);
    let first = fx.join_chassis(&fx.device(&dt), &vc, 0).await;
    let second = fx.join_chassis(&fx.device(&dt), &vc, 1).await;

    let lag = fx.component(
        &first,
        None,
        "ae0",
        ComponentData::Interface(InterfaceData {
            iface_type: InterfaceType::Lag,
            ..InterfaceData::default()
        }),
    );
    let mut member = fx.interface(&second, "et-1/0/0");
    if let Some(data) = member.as_interface_mut() {
        data.lag_id = lag.id;
    }
    let member = service.update_component(member).await.unwrap();

    match service.delete_virtual_chassis(vc.id.unwrap()).await.unwrap_err() {
        DcimError::StructuralInvariantViolation { objects, .. } => assert_eq!(objects, vec![member.id.unwrap()]),
        other => panic!("expected structural violation, got {:?}", other),
    }
    // Nothing changed
    assert!(fx.store.get_virtual_chassis(vc.id.unwrap()).await.is_ok());
    let second = fx.store.get_device(second.id.unwrap()).await.unwrap();
    assert_eq!(second.virtual_chassis_id, vc.id);
    assert_eq!(fx.store.transaction_depth().unwrap(), 0);

    // Moving the LAG member back onto its own device clears the way
    let mut local = member.clone();
    if let Some(data) = local.as_interface_mut() {
        data.lag_id = None;
    }
    service.update_component(local).await.unwrap();
    service.delete_virtual_chassis(vc.id.unwrap()).await.unwrap();
    assert!(fx.store.get_virtual_chassis(vc.id.unwrap()).await.is_err());
}
