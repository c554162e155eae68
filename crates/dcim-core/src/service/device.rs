//! Device operations

use super::{DcimService, Operation};
use crate::device::{apply_creation_defaults, apply_rack_location, clean_device};
use crate::error::DcimError;
use crate::notify::{ChangeEvent, ObjectKind};
use crate::template_set::TemplateSet;
use dcim_models::*;
use dcim_store::ComponentFilter;
use tracing::{debug, info};

impl DcimService {
    /// Validate, save and populate a new device from its type's templates
    pub async fn create_device(&self, device: Device) -> Result<Device, DcimError> {
        info!("Creating device {}", device.identifier());
        let op = self.begin().await?;
        let result = self.create_device_in_transaction(&op, device).await;
        self.finish(op, result).await
    }

    async fn create_device_in_transaction(&self, op: &Operation, mut device: Device) -> Result<Device, DcimError> {
        let store = op.store();
        clean_device(store, &device, &self.settings).await?.into_result()?;

        let device_type = store.get_device_type(device.device_type_id).await?;
        apply_creation_defaults(&mut device, &device_type);
        let rack = match device.rack_id {
            Some(id) => Some(store.get_rack(id).await?),
            None => None,
        };
        apply_rack_location(&mut device, rack.as_ref());

        let device = store.create_device(device).await?;
        let device_id = device
            .id
            .ok_or_else(|| DcimError::NotFound("Store returned a device without an id".to_string()))?;
        op.notify(ChangeEvent::created(ObjectKind::Device, device_id));

        let templates = TemplateSet::load(store, TemplateOwner::DeviceType(device.device_type_id)).await?;
        let components = op.instantiator().instantiate_device(&templates, device_id).await?;
        info!(
            "Created device {} with {} components",
            device.identifier(),
            components.len()
        );
        Ok(device)
    }

    /// Validate and save changes to a device; devices in its bays follow it
    pub async fn update_device(&self, device: Device) -> Result<Device, DcimError> {
        info!("Updating device {}", device.identifier());
        let op = self.begin().await?;
        let result = self.update_device_in_transaction(&op, device).await;
        self.finish(op, result).await
    }

    async fn update_device_in_transaction(&self, op: &Operation, mut device: Device) -> Result<Device, DcimError> {
        let store = op.store();
        let device_id = device
            .id
            .ok_or_else(|| DcimError::NotFound("Cannot update a device without an id".to_string()))?;
        clean_device(store, &device, &self.settings).await?.into_result()?;

        let rack = match device.rack_id {
            Some(id) => Some(store.get_rack(id).await?),
            None => None,
        };
        apply_rack_location(&mut device, rack.as_ref());
        let device = store.update_device(&device).await?;
        op.notify(ChangeEvent::updated(ObjectKind::Device, device_id, &[]));

        rehome_children(op, &device).await?;
        Ok(device)
    }

    /// Delete a device together with its components and modules
    pub async fn delete_device(&self, device_id: u64) -> Result<(), DcimError> {
        let op = self.begin().await?;
        let result: Result<(), DcimError> = async {
            let device = op.store().get_device(device_id).await?;
            info!("Deleting device {}", device.identifier());
            op.store().delete_device(device_id).await?;
            op.notify(ChangeEvent::deleted(ObjectKind::Device, device_id));
            Ok(())
        }
        .await;
        self.finish(op, result).await
    }
}

/// Copy site, rack and location down to devices installed in the bays
async fn rehome_children(op: &Operation, parent: &Device) -> Result<(), DcimError> {
    let Some(parent_id) = parent.id else {
        return Ok(());
    };
    let store = op.store();
    let bays = store
        .query_components(&ComponentFilter::of_device(parent_id).kind(ComponentKind::DeviceBay))
        .await?;
    for child_id in bays
        .iter()
        .filter_map(|bay| bay.as_device_bay().and_then(|data| data.installed_device_id))
    {
        let mut child = store.get_device(child_id).await?;
        if child.site_id == parent.site_id && child.rack_id == parent.rack_id && child.location_id == parent.location_id {
            continue;
        }
        child.site_id = parent.site_id;
        child.rack_id = parent.rack_id;
        child.location_id = parent.location_id;
        store.update_device(&child).await?;
        debug!("Moved child device {} with parent {}", child.identifier(), parent.identifier());
        op.notify(ChangeEvent::updated(ObjectKind::Device, child_id, &["site", "rack", "location"]));
    }
    Ok(())
}
