//! Component validation
//!
//! Checks the references a component holds: everything it points at must
//! live on the same device, or for interfaces on a member of the same
//! virtual chassis.

use crate::error::{DcimError, NON_FIELD_ERRORS, ValidationErrors};
use dcim_models::*;
use dcim_store::{ComponentFilter, DcimStore};

/// Validate a component against its stored version (`None` when new)
pub async fn clean_component(
    store: &dyn DcimStore,
    original: Option<&Component>,
    component: &Component,
) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();
    if let Some(original) = original
        && original.device_id != component.device_id
    {
        errors.referential("device", "Components cannot be moved to a different device.");
        return Ok(errors);
    }

    match &component.data {
        ComponentData::PowerPort(data) => {
            if let (Some(maximum), Some(allocated)) = (data.maximum_draw, data.allocated_draw)
                && allocated > maximum
            {
                errors.referential(
                    "allocated_draw",
                    format!("Allocated draw cannot exceed the maximum draw ({}W).", maximum),
                );
            }
        }
        ComponentData::PowerOutlet(data) => {
            if let Some(power_port_id) = data.power_port_id {
                let power_port = store.get_component(power_port_id).await?;
                if power_port.device_id != component.device_id {
                    errors.referential(
                        "power_port",
                        format!("Parent power port ({}) must belong to the same device", power_port.name),
                    );
                }
            }
        }
        ComponentData::Interface(data) => clean_interface(store, component, data, &mut errors).await?,
        ComponentData::FrontPort(data) => {
            let rear_port = store.get_component(data.rear_port_id).await?;
            if rear_port.device_id != component.device_id {
                errors.referential(
                    "rear_port",
                    format!("Rear port ({}) must belong to the same device", rear_port.name),
                );
            } else if let ComponentData::RearPort(rear) = &rear_port.data
                && data.rear_port_position > rear.positions
            {
                errors.referential(
                    "rear_port_position",
                    format!(
                        "Invalid rear port position ({}): Rear port {} has only {} positions",
                        data.rear_port_position, rear_port.name, rear.positions
                    ),
                );
            }
        }
        ComponentData::RearPort(data) => {
            if let Some(id) = component.id.filter(|_| original.is_some()) {
                let mapped = store
                    .query_components(&ComponentFilter::of_device(component.device_id).kind(ComponentKind::FrontPort))
                    .await?
                    .into_iter()
                    .filter(|front| matches!(&front.data, ComponentData::FrontPort(f) if f.rear_port_id == id))
                    .count();
                if usize::from(data.positions) < mapped {
                    errors.referential(
                        "positions",
                        format!(
                            "The number of positions cannot be less than the number of mapped front ports ({})",
                            mapped
                        ),
                    );
                }
            }
        }
        ComponentData::DeviceBay(data) => clean_device_bay(store, component, data, &mut errors).await?,
        ComponentData::InventoryItem(data) => {
            if let Some(parent_id) = data.parent_id {
                if component.id == Some(parent_id) {
                    errors.referential("parent", "Cannot assign self as parent.");
                } else if store.get_component(parent_id).await?.device_id != component.device_id {
                    errors.referential("parent", "Parent inventory item does not belong to the same device.");
                }
            }
            if let Some(reference) = data.component
                && store.get_component(reference.id()).await?.device_id != component.device_id
            {
                errors.referential("component", "Cannot assign inventory item to component on another device");
            }
        }
        ComponentData::ConsolePort(_) | ComponentData::ConsoleServerPort(_) | ComponentData::ModuleBay(_) => {}
    }
    Ok(errors)
}

async fn clean_interface(
    store: &dyn DcimStore,
    component: &Component,
    data: &InterfaceData,
    errors: &mut ValidationErrors,
) -> Result<(), DcimError> {
    let device = store.get_device(component.device_id).await?;

    if let Some(parent_id) = data.parent_id {
        if component.id == Some(parent_id) {
            errors.referential("parent", "An interface cannot be its own parent.");
        } else if data.iface_type != InterfaceType::Virtual {
            errors.referential("parent", "Only virtual interfaces may be assigned to a parent interface.");
        } else if let Some(message) = foreign_interface(store, &device, parent_id, "parent").await? {
            errors.referential("parent", message);
        }
    }

    if let Some(bridge_id) = data.bridge_id {
        if component.id == Some(bridge_id) {
            errors.referential("bridge", "An interface cannot be bridged to itself.");
        } else if let Some(message) = foreign_interface(store, &device, bridge_id, "bridge").await? {
            errors.referential("bridge", message);
        }
    }

    if let Some(lag_id) = data.lag_id {
        if data.iface_type == InterfaceType::Virtual {
            errors.referential("lag", "Virtual interfaces cannot have a parent LAG interface.");
        } else if component.id == Some(lag_id) {
            errors.referential("lag", "A LAG interface cannot be its own parent.");
        } else if let Some(message) = foreign_interface(store, &device, lag_id, "LAG").await? {
            errors.referential("lag", message);
        }
    }
    Ok(())
}

/// Error text when `other_id` is on another device outside `device`'s chassis
async fn foreign_interface(
    store: &dyn DcimStore,
    device: &Device,
    other_id: u64,
    role: &str,
) -> Result<Option<String>, DcimError> {
    let other = store.get_component(other_id).await?;
    if Some(other.device_id) == device.id {
        return Ok(None);
    }
    let other_device = store.get_device(other.device_id).await?;
    let Some(vc_id) = device.virtual_chassis_id else {
        return Ok(Some(format!(
            "The selected {} interface ({}) belongs to a different device ({}).",
            role,
            other.name,
            other_device.identifier()
        )));
    };
    if other_device.virtual_chassis_id == Some(vc_id) {
        return Ok(None);
    }
    let virtual_chassis = store.get_virtual_chassis(vc_id).await?;
    Ok(Some(format!(
        "The selected {} interface ({}) belongs to {}, which is not part of virtual chassis {}.",
        role,
        other.name,
        other_device.identifier(),
        virtual_chassis.name
    )))
}

async fn clean_device_bay(
    store: &dyn DcimStore,
    component: &Component,
    data: &DeviceBayData,
    errors: &mut ValidationErrors,
) -> Result<(), DcimError> {
    let device = store.get_device(component.device_id).await?;
    let device_type = store.get_device_type(device.device_type_id).await?;
    if !device_type.is_parent_device() {
        errors.referential(
            NON_FIELD_ERRORS,
            format!("This type of device ({}) does not support device bays.", device_type.model),
        );
    }

    let Some(installed_id) = data.installed_device_id else {
        return Ok(());
    };
    if Some(installed_id) == device.id {
        errors.referential("installed_device", "Cannot install a device into itself.");
        return Ok(());
    }
    let other_bays = store
        .query_components(&ComponentFilter::default().kind(ComponentKind::DeviceBay))
        .await?;
    if let Some(bay) = other_bays.iter().find(|bay| {
        bay.id != component.id && bay.as_device_bay().is_some_and(|b| b.installed_device_id == Some(installed_id))
    }) {
        errors.referential(
            "installed_device",
            format!("Cannot install the specified device; device is already installed in {}", bay.name),
        );
    }
    Ok(())
}
