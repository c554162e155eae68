//! Unit tests for the instantiate module

#[cfg(test)]
mod tests {
    use crate::error::DcimError;
    use crate::instantiate::{Instantiator, InventoryPlan};
    use crate::notify::{ChangeAction, ObjectKind};
    use crate::template_set::TemplateSet;
    use crate::test_utils::Fixture;
    use dcim_models::*;
    use dcim_store::{ComponentFilter, DcimStore};

    const OWNER: TemplateOwner = TemplateOwner::DeviceType(1);

    fn template(id: u64, name: &str, kind: TemplateKind) -> ComponentTemplate {
        ComponentTemplate {
            id,
            owner: OWNER,
            name: name.to_string(),
            label: String::new(),
            description: String::new(),
            kind,
        }
    }

    fn inventory(id: u64, name: &str, parent: Option<u64>) -> ComponentTemplate {
        template(
            id,
            name,
            TemplateKind::InventoryItem(InventoryItemTemplateData {
                parent_template_id: parent,
                ..InventoryItemTemplateData::default()
            }),
        )
    }

    /// A PDU-ish switch: console, two PSUs with an outlet each, four
    /// interfaces, a rear port with four front ports and a device bay
    fn switch_templates() -> TemplateSet {
        TemplateSet::new(
            OWNER,
            vec![
                template(
                    10,
                    "Front [1-4]",
                    TemplateKind::FrontPort(FrontPortTemplateData {
                        port_type: None,
                        rear_port_template_id: 11,
                        rear_port_position: 1,
                    }),
                ),
                template(11, "Rear 1", TemplateKind::RearPort(RearPortData { port_type: None, positions: 4 })),
                template(
                    12,
                    "Outlet [1-2]",
                    TemplateKind::PowerOutlet(PowerOutletTemplateData {
                        power_port_template_id: Some(13),
                        ..PowerOutletTemplateData::default()
                    }),
                ),
                template(13, "PSU[1-2]", TemplateKind::PowerPort(PowerPortData::default())),
                template(14, "eth[0-3]", TemplateKind::Interface(InterfaceTemplateData::default())),
                template(15, "Console", TemplateKind::ConsolePort(PortData::default())),
                template(16, "Bay 1", TemplateKind::DeviceBay),
            ],
        )
    }

    #[tokio::test]
    async fn test_device_components_follow_creation_order() {
        let fx = Fixture::new();
        let dt = fx.device_type("switch", Units::ONE, true);
        let device = fx.device(&dt);
        let device_id = device.id.unwrap();

        let created = Instantiator::new(&fx.store, &fx.observer, true)
            .instantiate_device(&switch_templates(), device_id)
            .await
            .unwrap();

        let names: Vec<&str> = created.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Console", "PSU1", "PSU2", "Outlet 1", "Outlet 2", "eth0", "eth1", "eth2", "eth3", "Rear 1", "Front 1",
                "Front 2", "Front 3", "Front 4", "Bay 1",
            ]
        );
        assert!(created.iter().all(|c| c.device_id == device_id && c.module_id.is_none()));

        // Every announcement came after the component was stored
        assert!(fx.observer.unsaved_at_notify().is_empty());
        assert_eq!(fx.observer.events().len(), created.len());
    }

    #[tokio::test]
    async fn test_references_resolve_to_created_components() {
        let fx = Fixture::new();
        let dt = fx.device_type("switch", Units::ONE, true);
        let device = fx.device(&dt);
        let created = Instantiator::new(&fx.store, &fx.observer, true)
            .instantiate_device(&switch_templates(), device.id.unwrap())
            .await
            .unwrap();
        let id_of = |name: &str| created.iter().find(|c| c.name == name).and_then(|c| c.id);

        for (outlet, psu) in [("Outlet 1", "PSU1"), ("Outlet 2", "PSU2")] {
            let component = created.iter().find(|c| c.name == outlet).unwrap();
            match &component.data {
                ComponentData::PowerOutlet(data) => assert_eq!(data.power_port_id, id_of(psu), "{}", outlet),
                other => panic!("expected power outlet, got {:?}", other),
            }
        }
        // Four front ports and one rear port: all map to the one rear port
        let rear_id = id_of("Rear 1").unwrap();
        let fronts: Vec<&Component> = created.iter().filter(|c| c.kind() == ComponentKind::FrontPort).collect();
        assert_eq!(fronts.len(), 4);
        assert!(
            fronts
                .iter()
                .all(|c| matches!(&c.data, ComponentData::FrontPort(data) if data.rear_port_id == rear_id))
        );
    }

    #[tokio::test]
    async fn test_single_writes_match_bulk() {
        let fx = Fixture::new();
        let dt = fx.device_type("switch", Units::ONE, true);
        let device = fx.device(&dt);
        let created = Instantiator::new(&fx.store, &fx.observer, false)
            .instantiate_device(&switch_templates(), device.id.unwrap())
            .await
            .unwrap();
        assert_eq!(created.len(), 15);
        assert!(fx.observer.unsaved_at_notify().is_empty());
        assert_eq!(fx.observer.created(ObjectKind::Component(ComponentKind::Interface)).len(), 4);
    }

    #[tokio::test]
    async fn test_interfaces_bridged_after_creation() {
        let fx = Fixture::new();
        let dt = fx.device_type("router", Units::ONE, true);
        let device = fx.device(&dt);
        let templates = TemplateSet::new(
            OWNER,
            vec![
                template(
                    20,
                    "eth[0-1]",
                    TemplateKind::Interface(InterfaceTemplateData {
                        bridge_template_id: Some(21),
                        ..InterfaceTemplateData::default()
                    }),
                ),
                template(
                    21,
                    "br0",
                    TemplateKind::Interface(InterfaceTemplateData {
                        iface_type: InterfaceType::Bridge,
                        ..InterfaceTemplateData::default()
                    }),
                ),
            ],
        );

        Instantiator::new(&fx.store, &fx.observer, true)
            .instantiate_device(&templates, device.id.unwrap())
            .await
            .unwrap();

        let interfaces = fx
            .store
            .query_components(&ComponentFilter::of_device(device.id.unwrap()).kind(ComponentKind::Interface))
            .await
            .unwrap();
        let bridge_id = interfaces.iter().find(|c| c.name == "br0").and_then(|c| c.id);
        for name in ["eth0", "eth1"] {
            let iface = interfaces.iter().find(|c| c.name == name).unwrap();
            assert_eq!(iface.as_interface().unwrap().bridge_id, bridge_id, "{}", name);
        }

        let bridge_updates: Vec<_> = fx
            .observer
            .events()
            .into_iter()
            .filter(|e| e.action == ChangeAction::Updated { fields: vec!["bridge".to_string()] })
            .collect();
        assert_eq!(bridge_updates.len(), 2);
    }

    #[tokio::test]
    async fn test_inventory_items_created_parents_first() {
        let fx = Fixture::new();
        let dt = fx.device_type("chassis", Units::whole(4), true);
        let device = fx.device(&dt);
        // Children listed before their parent
        let templates = TemplateSet::new(
            OWNER,
            vec![
                inventory(30, "Fan [1-2]", Some(31)),
                inventory(31, "Fan tray", Some(32)),
                inventory(32, "Chassis", None),
                template(33, "mgmt0", TemplateKind::Interface(InterfaceTemplateData::default())),
                template(
                    34,
                    "Optic",
                    TemplateKind::InventoryItem(InventoryItemTemplateData {
                        component: Some(ComponentRef::Interface(33)),
                        ..InventoryItemTemplateData::default()
                    }),
                ),
            ],
        );

        let created = Instantiator::new(&fx.store, &fx.observer, true)
            .instantiate_device(&templates, device.id.unwrap())
            .await
            .unwrap();
        let items: Vec<&Component> = created
            .iter()
            .filter(|c| c.kind() == ComponentKind::InventoryItem)
            .collect();
        let names: Vec<&str> = items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Chassis", "Fan tray", "Fan 1", "Fan 2", "Optic"]);

        let parent_of = |name: &str| {
            items
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.as_inventory_item())
                .and_then(|data| data.parent_id)
        };
        let id_of = |name: &str| created.iter().find(|c| c.name == name).and_then(|c| c.id);
        assert_eq!(parent_of("Chassis"), None);
        assert_eq!(parent_of("Fan tray"), id_of("Chassis"));
        assert_eq!(parent_of("Fan 1"), id_of("Fan tray"));
        assert_eq!(parent_of("Fan 2"), id_of("Fan tray"));

        let optic = items.iter().find(|c| c.name == "Optic").and_then(|c| c.as_inventory_item()).unwrap();
        assert_eq!(optic.component, id_of("mgmt0").map(ComponentRef::Interface));
    }

    #[test]
    fn test_inventory_cycle_rejected() {
        let templates = TemplateSet::new(
            OWNER,
            vec![inventory(40, "A", Some(41)), inventory(41, "B", Some(40)), inventory(42, "C", None)],
        );
        let err = InventoryPlan::new(&templates).unwrap_err();
        assert!(matches!(err, DcimError::InvalidTemplate(_)), "got {:?}", err);

        let outside = TemplateSet::new(OWNER, vec![inventory(43, "Orphan", Some(99))]);
        assert!(matches!(InventoryPlan::new(&outside), Err(DcimError::InvalidTemplate(_))));
    }

    #[test]
    fn test_inventory_plan_orders_every_template_once() {
        let templates = TemplateSet::new(
            OWNER,
            vec![
                inventory(50, "Leaf", Some(51)),
                inventory(51, "Branch", Some(52)),
                inventory(52, "Root", None),
                inventory(53, "Other", Some(52)),
            ],
        );
        let plan = InventoryPlan::new(&templates).unwrap();
        assert_eq!(plan.len(), 4);
        let names: Vec<&str> = plan.ordered().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Branch", "Leaf", "Other"]);
    }

    #[tokio::test]
    async fn test_dangling_reference_is_invalid_template() {
        let fx = Fixture::new();
        let dt = fx.device_type("pdu", Units::ONE, false);
        let device = fx.device(&dt);
        let templates = TemplateSet::new(
            OWNER,
            vec![template(
                60,
                "Outlet 1",
                TemplateKind::PowerOutlet(PowerOutletTemplateData {
                    power_port_template_id: Some(999),
                    ..PowerOutletTemplateData::default()
                }),
            )],
        );
        let err = Instantiator::new(&fx.store, &fx.observer, true)
            .instantiate_device(&templates, device.id.unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DcimError::InvalidTemplate(_)), "got {:?}", err);
    }
}
