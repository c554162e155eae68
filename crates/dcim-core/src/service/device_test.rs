//! Unit tests for device operations

#[cfg(test)]
mod tests {
    use crate::error::DcimError;
    use crate::notify::{ChangeAction, ObjectKind};
    use crate::test_utils::Fixture;
    use dcim_models::*;
    use dcim_store::{ComponentFilter, DcimStore, DeviceFilter};

    fn racked(dt: &DeviceType, rack: &Rack, position: u32, face: RackFace) -> Device {
        let mut device = Device::new(dt.id.unwrap(), 1, rack.site_id);
        device.rack_id = Some(rack.id);
        device.position = Some(Units::whole(position));
        device.face = Some(face);
        device
    }

    #[tokio::test]
    async fn test_create_device_populates_components() {
        let fx = Fixture::new();
        let cage = fx.location(&fx.site, "cage 1");
        let rack = fx.rack_in(&fx.site, Some(cage.id), 42);
        let platform = fx.platform(Some(1));
        let mut dt = fx.device_type("leaf", Units::ONE, true);
        dt.airflow = Some(Airflow::FrontToRear);
        dt.default_platform_id = Some(platform.id);
        let dt = fx.store.update_device_type(&dt).await.unwrap();
        let owner = TemplateOwner::DeviceType(dt.id.unwrap());
        fx.template(owner, "Console", TemplateKind::ConsolePort(PortData::default()));
        fx.template(owner, "Ethernet[1-48]", TemplateKind::Interface(InterfaceTemplateData::default()));

        let mut device = racked(&dt, &rack, 20, RackFace::Front);
        device.name = Some("leaf01".to_string());
        let device = fx.service().create_device(device).await.unwrap();
        let device_id = device.id.unwrap();

        assert_eq!(device.location_id, Some(cage.id), "location follows the rack");
        assert_eq!(device.airflow, Some(Airflow::FrontToRear));
        assert_eq!(device.platform_id, Some(platform.id));

        let components = fx
            .store
            .query_components(&ComponentFilter::of_device(device_id))
            .await
            .unwrap();
        assert_eq!(components.len(), 49);
        assert!(components.iter().all(|c| c.module_id.is_none()));

        let events = fx.observer.events();
        assert_eq!(events[0].object, ObjectKind::Device);
        assert_eq!(events[0].action, ChangeAction::Created);
        assert_eq!(events.len(), 50);
        assert_eq!(fx.store.transaction_depth().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_device_rejects_overlap() {
        let fx = Fixture::new();
        let rack = fx.rack(42);
        let dt = fx.device_type("2U", Units::whole(2), true);
        let first = fx.racked_device(&dt, &rack, 40, RackFace::Front);

        let err = fx
            .service()
            .create_device(racked(&dt, &rack, 41, RackFace::Front))
            .await
            .unwrap_err();
        match err {
            DcimError::PlacementConflict(errors) => {
                assert_eq!(errors.get("position")[0].objects, vec![first.id.unwrap()]);
            }
            other => panic!("expected placement conflict, got {:?}", other),
        }
        let racked = fx.store.query_devices(&DeviceFilter::in_rack(rack.id)).await.unwrap();
        assert_eq!(racked.len(), 1);
        assert_eq!(fx.store.transaction_depth().unwrap(), 0);
        assert!(fx.observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_instantiation_rolls_back_device() {
        let fx = Fixture::new();
        let dt = fx.device_type("pdu", Units::ONE, false);
        let owner = TemplateOwner::DeviceType(dt.id.unwrap());
        fx.template(owner, "PSU1", TemplateKind::PowerPort(PowerPortData::default()));
        fx.template(
            owner,
            "Outlet 1",
            TemplateKind::PowerOutlet(PowerOutletTemplateData {
                power_port_template_id: Some(424242),
                ..PowerOutletTemplateData::default()
            }),
        );

        let err = fx
            .service()
            .create_device(Device::new(dt.id.unwrap(), 1, fx.site.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DcimError::InvalidTemplate(_)), "got {:?}", err);

        let devices = fx.store.query_devices(&DeviceFilter::of_type(dt.id.unwrap())).await.unwrap();
        assert!(devices.is_empty());
        assert!(fx.store.components().unwrap().is_empty(), "PSU1 is rolled back too");
        assert_eq!(fx.store.transaction_depth().unwrap(), 0);
        assert!(fx.observer.events().is_empty(), "rolled back writes are not announced");
    }

    #[tokio::test]
    async fn test_create_device_announces_after_commit() {
        let fx = Fixture::new();
        let dt = fx.device_type("switch", Units::ONE, false);
        let owner = TemplateOwner::DeviceType(dt.id.unwrap());
        fx.template(owner, "eth0", TemplateKind::Interface(InterfaceTemplateData::default()));
        fx.template(owner, "eth1", TemplateKind::Interface(InterfaceTemplateData::default()));

        let device = fx
            .service()
            .create_device(Device::new(dt.id.unwrap(), 1, fx.site.id))
            .await
            .unwrap();

        let events = fx.observer.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].object, ObjectKind::Device);
        assert_eq!(events[0].object_id, device.id.unwrap());
        assert_eq!(fx.observer.created(ObjectKind::Component(ComponentKind::Interface)).len(), 2);
        assert!(fx.observer.unsaved_at_notify().is_empty());
    }

    #[tokio::test]
    async fn test_update_device_moves_children() {
        let fx = Fixture::new();
        let rack_a = fx.rack(42);
        let rack_b = fx.rack(42);
        let mut chassis_type = fx.device_type("blade chassis", Units::whole(10), true);
        chassis_type.subdevice_role = Some(SubdeviceRole::Parent);
        let chassis_type = fx.store.update_device_type(&chassis_type).await.unwrap();
        let mut blade_type = fx.device_type("blade", Units::ZERO, false);
        blade_type.subdevice_role = Some(SubdeviceRole::Child);
        let blade_type = fx.store.update_device_type(&blade_type).await.unwrap();

        let chassis = fx.racked_device(&chassis_type, &rack_a, 1, RackFace::Front);
        let mut blade = fx.device(&blade_type);
        blade.rack_id = Some(rack_a.id);
        let blade = fx.save_device(&blade).await;
        fx.component(
            &chassis,
            None,
            "Bay 1",
            ComponentData::DeviceBay(DeviceBayData {
                installed_device_id: blade.id,
            }),
        );

        let mut moved = chassis.clone();
        moved.rack_id = Some(rack_b.id);
        fx.service().update_device(moved).await.unwrap();

        let blade = fx.store.get_device(blade.id.unwrap()).await.unwrap();
        assert_eq!(blade.rack_id, Some(rack_b.id));
        assert_eq!(fx.observer.updated(ObjectKind::Device), vec![chassis.id.unwrap(), blade.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_delete_device_announces_deletion() {
        let fx = Fixture::new();
        let dt = fx.device_type("server", Units::ONE, true);
        let device = fx.device(&dt);
        fx.interface(&device, "eth0");

        fx.service().delete_device(device.id.unwrap()).await.unwrap();
        assert!(fx.store.components().unwrap().is_empty());
        let events = fx.observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, ChangeAction::Deleted);
    }
}
