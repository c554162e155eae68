//! DCIM records of the in-memory store
//!
//! Writes enforce the constraints a relational schema would: unique rack
//! slots and chassis positions, one module per bay, unique component names
//! per device and kind, and cascading deletes.

use super::MemoryState;
use crate::error::StoreError;
use dcim_models::*;
use std::collections::BTreeSet;
use tracing::debug;

fn integrity(message: String) -> StoreError {
    StoreError::IntegrityViolation(message)
}

fn require_id(id: Option<u64>, what: &str) -> Result<u64, StoreError> {
    id.ok_or_else(|| StoreError::InvalidRequest(format!("{} has no id; create it first", what)))
}

pub(super) fn update_device_type(state: &mut MemoryState, device_type: &DeviceType) -> Result<DeviceType, StoreError> {
    let id = require_id(device_type.id, "Device type")?;
    let slot = state
        .device_types
        .get_mut(&id)
        .ok_or_else(|| StoreError::NotFound(format!("Device type {} not found", id)))?;
    *slot = device_type.clone();
    Ok(device_type.clone())
}

pub(super) fn query_templates(
    state: &MemoryState,
    owner: TemplateOwner,
    kind: Option<ComponentKind>,
) -> Vec<ComponentTemplate> {
    state
        .templates
        .values()
        .filter(|t| t.owner == owner && kind.is_none_or(|k| t.component_kind() == k))
        .cloned()
        .collect()
}

fn check_device(state: &MemoryState, id: u64, device: &Device) -> Result<(), StoreError> {
    if !state.device_types.contains_key(&device.device_type_id) {
        return Err(integrity(format!("device type {} does not exist", device.device_type_id)));
    }
    if let Some(rack_id) = device.rack_id
        && !state.racks.contains_key(&rack_id)
    {
        return Err(integrity(format!("rack {} does not exist", rack_id)));
    }

    for (other_id, other) in &state.devices {
        if *other_id == id {
            continue;
        }
        if device.rack_id.is_some()
            && device.position.is_some()
            && device.face.is_some()
            && other.rack_id == device.rack_id
            && other.position == device.position
            && other.face == device.face
        {
            return Err(integrity(format!(
                "rack {} position {} is already taken by device {}",
                device.rack_id.unwrap_or_default(),
                device.position.unwrap_or_default(),
                other_id
            )));
        }
        if device.virtual_chassis_id.is_some()
            && device.vc_position.is_some()
            && other.virtual_chassis_id == device.virtual_chassis_id
            && other.vc_position == device.vc_position
        {
            return Err(integrity(format!(
                "virtual chassis position {} is already taken by device {}",
                device.vc_position.unwrap_or_default(),
                other_id
            )));
        }
        if device.name.is_some() && other.site_id == device.site_id && other.name == device.name {
            return Err(integrity(format!(
                "device name {} is already used at site {}",
                device.identifier(),
                device.site_id
            )));
        }
    }
    Ok(())
}

pub(super) fn insert_device(state: &mut MemoryState, mut device: Device) -> Result<Device, StoreError> {
    let id = state.id_or_allocate(device.id);
    if state.devices.contains_key(&id) {
        return Err(integrity(format!("device {} already exists", id)));
    }
    check_device(state, id, &device)?;
    device.id = Some(id);
    state.devices.insert(id, device.clone());
    debug!("Stored device {}", device.identifier());
    Ok(device)
}

pub(super) fn update_device(state: &mut MemoryState, device: &Device) -> Result<Device, StoreError> {
    let id = require_id(device.id, "Device")?;
    if !state.devices.contains_key(&id) {
        return Err(StoreError::NotFound(format!("Device {} not found", id)));
    }
    check_device(state, id, device)?;
    state.devices.insert(id, device.clone());
    Ok(device.clone())
}

pub(super) fn delete_device(state: &mut MemoryState, id: u64) -> Result<(), StoreError> {
    if !state.devices.contains_key(&id) {
        return Err(StoreError::NotFound(format!("Device {} not found", id)));
    }
    if let Some(vc) = state.virtual_chassis.values().find(|vc| vc.master_id == Some(id)) {
        return Err(integrity(format!(
            "device {} is the master of virtual chassis {}",
            id, vc.name
        )));
    }

    state.modules.retain(|_, m| m.device_id != id);
    let removed: BTreeSet<u64> = state
        .components
        .iter()
        .filter(|(_, c)| c.device_id == id)
        .map(|(component_id, _)| *component_id)
        .collect();
    remove_components(state, &removed);

    for component in state.components.values_mut() {
        if let ComponentData::DeviceBay(bay) = &mut component.data
            && bay.installed_device_id == Some(id)
        {
            bay.installed_device_id = None;
        }
    }
    state.devices.remove(&id);
    debug!("Deleted device {} with {} components", id, removed.len());
    Ok(())
}

pub(super) fn insert_module(state: &mut MemoryState, mut module: Module) -> Result<Module, StoreError> {
    if !state.devices.contains_key(&module.device_id) {
        return Err(integrity(format!("device {} does not exist", module.device_id)));
    }
    if !state.module_types.contains_key(&module.module_type_id) {
        return Err(integrity(format!("module type {} does not exist", module.module_type_id)));
    }
    let bay_ok = state
        .components
        .get(&module.module_bay_id)
        .is_some_and(|bay| bay.device_id == module.device_id && bay.as_module_bay().is_some());
    if !bay_ok {
        return Err(integrity(format!(
            "module bay {} does not belong to device {}",
            module.module_bay_id, module.device_id
        )));
    }
    if let Some(occupant) = state.modules.values().find(|m| m.module_bay_id == module.module_bay_id) {
        return Err(integrity(format!(
            "module bay {} already holds module {}",
            module.module_bay_id,
            occupant.id.unwrap_or_default()
        )));
    }

    let id = state.id_or_allocate(module.id);
    module.id = Some(id);
    state.modules.insert(id, module.clone());
    Ok(module)
}

pub(super) fn delete_module(state: &mut MemoryState, id: u64) -> Result<(), StoreError> {
    if state.modules.remove(&id).is_none() {
        return Err(StoreError::NotFound(format!("Module {} not found", id)));
    }
    let removed: BTreeSet<u64> = state
        .components
        .iter()
        .filter(|(_, c)| c.module_id == Some(id))
        .map(|(component_id, _)| *component_id)
        .collect();
    remove_components(state, &removed);
    debug!("Deleted module {} with {} components", id, removed.len());
    Ok(())
}

pub(super) fn update_virtual_chassis(
    state: &mut MemoryState,
    virtual_chassis: &VirtualChassis,
) -> Result<VirtualChassis, StoreError> {
    let id = require_id(virtual_chassis.id, "Virtual chassis")?;
    if let Some(master_id) = virtual_chassis.master_id
        && !state.devices.contains_key(&master_id)
    {
        return Err(integrity(format!("device {} does not exist", master_id)));
    }
    let slot = state
        .virtual_chassis
        .get_mut(&id)
        .ok_or_else(|| StoreError::NotFound(format!("Virtual chassis {} not found", id)))?;
    *slot = virtual_chassis.clone();
    Ok(virtual_chassis.clone())
}

pub(super) fn delete_virtual_chassis(state: &mut MemoryState, id: u64) -> Result<(), StoreError> {
    if state.virtual_chassis.remove(&id).is_none() {
        return Err(StoreError::NotFound(format!("Virtual chassis {} not found", id)));
    }
    for device in state.devices.values_mut() {
        if device.virtual_chassis_id == Some(id) {
            device.virtual_chassis_id = None;
            device.vc_position = None;
            device.vc_priority = None;
        }
    }
    Ok(())
}

/// Uniqueness key of a component: inventory items are unique per parent,
/// every other kind per device.
fn name_key(component: &Component) -> (u64, ComponentKind, Option<u64>, &str) {
    let parent = component.as_inventory_item().and_then(|item| item.parent_id);
    (component.device_id, component.kind(), parent, component.name.as_str())
}

fn check_component(state: &MemoryState, component: &Component) -> Result<(), StoreError> {
    if !state.devices.contains_key(&component.device_id) {
        return Err(integrity(format!("device {} does not exist", component.device_id)));
    }
    if let Some(module_id) = component.module_id {
        match state.modules.get(&module_id) {
            Some(module) if module.device_id == component.device_id => {}
            Some(_) => {
                return Err(integrity(format!(
                    "module {} is not installed in device {}",
                    module_id, component.device_id
                )));
            }
            None => return Err(integrity(format!("module {} does not exist", module_id))),
        }
    }
    Ok(())
}

pub(super) fn insert_components(
    state: &mut MemoryState,
    components: Vec<Component>,
) -> Result<Vec<Component>, StoreError> {
    let mut batch_keys = BTreeSet::new();
    for component in &components {
        check_component(state, component)?;
        let key = name_key(component);
        let clash = state
            .components
            .values()
            .any(|existing| existing.id != component.id && name_key(existing) == key);
        if clash || !batch_keys.insert(key) {
            return Err(integrity(format!(
                "{} with name {} already exists on device {}",
                component.kind(),
                component.name,
                component.device_id
            )));
        }
    }

    let mut created = Vec::with_capacity(components.len());
    for mut component in components {
        let id = state.id_or_allocate(component.id);
        component.id = Some(id);
        state.components.insert(id, component.clone());
        created.push(component);
    }
    Ok(created)
}

pub(super) fn update_components(state: &mut MemoryState, components: &[Component]) -> Result<(), StoreError> {
    for component in components {
        let id = require_id(component.id, "Component")?;
        if !state.components.contains_key(&id) {
            return Err(StoreError::NotFound(format!("Component {} not found", id)));
        }
        check_component(state, component)?;
        let key = name_key(component);
        if state
            .components
            .iter()
            .any(|(other_id, other)| *other_id != id && name_key(other) == key)
        {
            return Err(integrity(format!(
                "{} with name {} already exists on device {}",
                component.kind(),
                component.name,
                component.device_id
            )));
        }
    }
    for component in components {
        if let Some(id) = component.id {
            state.components.insert(id, component.clone());
        }
    }
    Ok(())
}

/// Delete components and null out references to them
fn remove_components(state: &mut MemoryState, removed: &BTreeSet<u64>) {
    if removed.is_empty() {
        return;
    }
    state.components.retain(|id, _| !removed.contains(id));

    let gone = |id: &Option<u64>| id.is_some_and(|id| removed.contains(&id));
    for component in state.components.values_mut() {
        match &mut component.data {
            ComponentData::Interface(iface) => {
                if gone(&iface.bridge_id) {
                    iface.bridge_id = None;
                }
                if gone(&iface.lag_id) {
                    iface.lag_id = None;
                }
                if gone(&iface.parent_id) {
                    iface.parent_id = None;
                }
            }
            ComponentData::PowerOutlet(outlet) => {
                if gone(&outlet.power_port_id) {
                    outlet.power_port_id = None;
                }
            }
            ComponentData::InventoryItem(item) => {
                if gone(&item.parent_id) {
                    item.parent_id = None;
                }
                if item.component.is_some_and(|c| removed.contains(&c.id())) {
                    item.component = None;
                }
            }
            _ => {}
        }
    }
    for ip in state.ip_addresses.values_mut() {
        if ip.interface_id().is_some_and(|id| removed.contains(&id)) {
            ip.assigned_object = None;
        }
    }
}
