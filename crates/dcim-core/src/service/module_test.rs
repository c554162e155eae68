//! Unit tests for module installation

#[cfg(test)]
mod tests {
    use crate::error::DcimError;
    use crate::module::ModuleInstallOptions;
    use crate::notify::{ChangeAction, ObjectKind};
    use crate::test_utils::Fixture;
    use dcim_models::*;
    use dcim_store::{ComponentFilter, DcimStore};

    struct Chassis {
        device: Device,
        bay: Component,
        line_card: ModuleType,
    }

    /// A device with bay "Slot 1" at position 1, and a line card type with
    /// interfaces et-{module}/0/[0-1]
    fn chassis(fx: &Fixture, bay_position: &str) -> Chassis {
        let dt = fx.device_type("MX240", Units::whole(5), true);
        let device = fx.device(&dt);
        let bay = fx.module_bay(&device, "Slot 1", bay_position);
        let line_card = fx.module_type("MPC7E");
        fx.template(
            TemplateOwner::ModuleType(line_card.id),
            "et-{module}/0/[0-1]",
            TemplateKind::Interface(InterfaceTemplateData::default()),
        );
        Chassis { device, bay, line_card }
    }

    fn module(chassis: &Chassis) -> Module {
        Module {
            id: None,
            device_id: chassis.device.id.unwrap(),
            module_bay_id: chassis.bay.id.unwrap(),
            module_type_id: chassis.line_card.id,
            status: ModuleStatus::Active,
            serial: "CAFE0001".to_string(),
            asset_tag: None,
        }
    }

    fn options(adopt: bool, replicate: bool) -> ModuleInstallOptions {
        ModuleInstallOptions {
            replicate_components: replicate,
            adopt_components: adopt,
        }
    }

    async fn interfaces(fx: &Fixture, device: &Device) -> Vec<Component> {
        fx.store
            .query_components(&ComponentFilter::of_device(device.id.unwrap()).kind(ComponentKind::Interface))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replicate_creates_module_components() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        let installed = fx
            .service()
            .create_module(module(&chassis), ModuleInstallOptions::default())
            .await
            .unwrap();
        let module_id = installed.module.id.unwrap();

        let names: Vec<&str> = installed.report.created.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["et-1/0/0", "et-1/0/1"]);
        assert!(installed.report.created.iter().all(|c| c.module_id == Some(module_id)));
        assert!(installed.report.adopted.is_empty());

        assert_eq!(fx.observer.created(ObjectKind::Module), vec![module_id]);
        assert_eq!(fx.observer.created(ObjectKind::Component(ComponentKind::Interface)).len(), 2);
        assert!(fx.observer.unsaved_at_notify().is_empty());
    }

    #[tokio::test]
    async fn test_adopt_takes_over_orphans() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        let orphan = fx.interface(&chassis.device, "et-1/0/0");

        let installed = fx
            .service()
            .create_module(module(&chassis), options(true, false))
            .await
            .unwrap();
        let module_id = installed.module.id;

        assert!(installed.report.created.is_empty(), "adopt-only creates nothing");
        assert_eq!(installed.report.adopted.len(), 1);
        let adopted = fx.store.get_component(orphan.id.unwrap()).await.unwrap();
        assert_eq!(adopted.module_id, module_id);
        assert_eq!(interfaces(&fx, &chassis.device).await.len(), 1);

        let updates: Vec<_> = fx
            .observer
            .events()
            .into_iter()
            .filter(|e| e.object_id == orphan.id.unwrap())
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].action, ChangeAction::Updated { fields: vec!["module".to_string()] });
    }

    #[tokio::test]
    async fn test_adopt_and_replicate_fills_the_gaps() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        fx.interface(&chassis.device, "et-1/0/0");
        // Same name on another position is not a match
        fx.interface(&chassis.device, "et-2/0/1");

        let installed = fx
            .service()
            .create_module(module(&chassis), options(true, true))
            .await
            .unwrap();
        let module_id = installed.module.id;
        assert_eq!(installed.report.adopted.len(), 1);
        assert_eq!(installed.report.created.len(), 1);
        assert_eq!(installed.report.created[0].name, "et-1/0/1");

        let all = interfaces(&fx, &chassis.device).await;
        assert_eq!(all.len(), 3, "no duplicate of the adopted interface");
        let owned: Vec<&str> = all
            .iter()
            .filter(|c| c.module_id == module_id)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(owned, vec!["et-1/0/0", "et-1/0/1"]);
    }

    #[tokio::test]
    async fn test_disabled_population_only_saves_module() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        fx.interface(&chassis.device, "et-1/0/0");

        let installed = fx
            .service()
            .create_module(module(&chassis), options(false, false))
            .await
            .unwrap();
        assert!(installed.report.created.is_empty());
        assert!(installed.report.adopted.is_empty());
        let all = interfaces(&fx, &chassis.device).await;
        assert_eq!(all.len(), 1);
        assert!(all[0].module_id.is_none());
    }

    #[tokio::test]
    async fn test_replicate_refuses_existing_names() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        fx.interface(&chassis.device, "et-1/0/1");

        let err = fx
            .service()
            .create_module(module(&chassis), ModuleInstallOptions::default())
            .await
            .unwrap_err();
        match err {
            DcimError::ReferentialMismatch(errors) => assert_eq!(
                errors.messages(crate::error::NON_FIELD_ERRORS),
                vec!["Cannot create interface et-1/0/1: a component with that name already exists on this device"]
            ),
            other => panic!("expected referential mismatch, got {:?}", other),
        }
        let modules = fx.store.query_modules(chassis.device.id.unwrap()).await.unwrap();
        assert!(modules.is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_needs_bay_position() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "");
        let err = fx
            .service()
            .create_module(module(&chassis), ModuleInstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DcimError::PlacementConflict(_)), "got {:?}", err);
        assert_eq!(fx.store.transaction_depth().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_module_removes_its_components() {
        let fx = Fixture::new();
        let chassis = chassis(&fx, "1");
        let keep = fx.interface(&chassis.device, "fxp0");
        let installed = fx
            .service()
            .create_module(module(&chassis), ModuleInstallOptions::default())
            .await
            .unwrap();

        fx.service().delete_module(installed.module.id.unwrap()).await.unwrap();
        let remaining = interfaces(&fx, &chassis.device).await;
        assert_eq!(remaining, vec![keep]);
    }
}
