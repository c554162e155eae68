//! Component operations

use super::DcimService;
use crate::components::clean_component;
use crate::error::DcimError;
use crate::notify::{ChangeEvent, ObjectKind};
use dcim_models::*;
use tracing::{debug, info};

impl DcimService {
    /// Validate and save a single new component
    pub async fn create_component(&self, component: Component) -> Result<Component, DcimError> {
        debug!("Creating {} {} on device {}", component.kind(), component.name, component.device_id);
        let op = self.begin().await?;
        let result: Result<Component, DcimError> = async {
            clean_component(op.store(), None, &component).await?.into_result()?;
            let created = op.store().create_component(component).await?;
            if let Some(id) = created.id {
                op.notify(ChangeEvent::created(ObjectKind::Component(created.kind()), id).on_device(created.device_id));
            }
            Ok(created)
        }
        .await;
        self.finish(op, result).await
    }

    /// Validate and save changes to an existing component
    pub async fn update_component(&self, component: Component) -> Result<Component, DcimError> {
        let component_id = component
            .id
            .ok_or_else(|| DcimError::NotFound("Cannot update a component without an id".to_string()))?;
        debug!("Updating {} {} on device {}", component.kind(), component.name, component.device_id);
        let op = self.begin().await?;
        let result: Result<Component, DcimError> = async {
            let original = op.store().get_component(component_id).await?;
            clean_component(op.store(), Some(&original), &component)
                .await?
                .into_result()?;
            let saved = op.store().update_component(&component).await?;
            op.notify(ChangeEvent::updated(ObjectKind::Component(saved.kind()), component_id, &[]).on_device(saved.device_id));
            Ok(saved)
        }
        .await;
        self.finish(op, result).await
    }

    /// Put a child device into a device bay; the child takes the parent's
    /// site, rack and location
    pub async fn install_device_in_bay(&self, bay_id: u64, child_id: u64) -> Result<Component, DcimError> {
        let op = self.begin().await?;
        let result: Result<Component, DcimError> = async {
            let original = op.store().get_component(bay_id).await?;
            let mut bay = original.clone();
            match &mut bay.data {
                ComponentData::DeviceBay(data) => data.installed_device_id = Some(child_id),
                _ => {
                    return Err(DcimError::NotFound(format!("Component {} is not a device bay", bay_id)));
                }
            }
            clean_component(op.store(), Some(&original), &bay).await?.into_result()?;
            let bay = op.store().update_component(&bay).await?;
            op.notify(
                ChangeEvent::updated(ObjectKind::Component(ComponentKind::DeviceBay), bay_id, &["installed_device"])
                    .on_device(bay.device_id),
            );

            let parent = op.store().get_device(bay.device_id).await?;
            let mut child = op.store().get_device(child_id).await?;
            child.site_id = parent.site_id;
            child.rack_id = parent.rack_id;
            child.location_id = parent.location_id;
            op.store().update_device(&child).await?;
            op.notify(ChangeEvent::updated(ObjectKind::Device, child_id, &["site", "rack", "location"]));
            info!("Installed device {} in {} of {}", child.identifier(), bay.name, parent.identifier());
            Ok(bay)
        }
        .await;
        self.finish(op, result).await
    }
}
