//! Query filters
//!
//! Typed equivalents of the `?rack_id=7&position__isnull=false` style
//! filters a REST backend takes. Each filter can also test a single record,
//! which is how the in-memory store applies it.

use dcim_models::{Component, ComponentKind, Device, IpAddress};

/// Device query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub rack_id: Option<u64>,
    pub device_type_id: Option<u64>,
    pub virtual_chassis_id: Option<u64>,
    /// Only devices with a rack position
    pub positioned: bool,
    pub exclude: Vec<u64>,
}

impl DeviceFilter {
    pub fn in_rack(rack_id: u64) -> Self {
        Self {
            rack_id: Some(rack_id),
            ..Self::default()
        }
    }

    pub fn of_type(device_type_id: u64) -> Self {
        Self {
            device_type_id: Some(device_type_id),
            ..Self::default()
        }
    }

    pub fn in_virtual_chassis(virtual_chassis_id: u64) -> Self {
        Self {
            virtual_chassis_id: Some(virtual_chassis_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn positioned(mut self) -> Self {
        self.positioned = true;
        self
    }

    #[must_use]
    pub fn excluding(mut self, ids: &[u64]) -> Self {
        self.exclude.extend_from_slice(ids);
        self
    }

    pub fn matches(&self, device: &Device) -> bool {
        if self.rack_id.is_some() && device.rack_id != self.rack_id {
            return false;
        }
        if self.device_type_id.is_some_and(|id| device.device_type_id != id) {
            return false;
        }
        if self.virtual_chassis_id.is_some() && device.virtual_chassis_id != self.virtual_chassis_id {
            return false;
        }
        if self.positioned && device.position.is_none() {
            return false;
        }
        !device.id.is_some_and(|id| self.exclude.contains(&id))
    }
}

/// Which module ownership a component query accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModuleScope {
    #[default]
    Any,
    /// Device-native components only (no owning module)
    Unassigned,
    Module(u64),
}

/// Component query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    pub device_id: Option<u64>,
    pub kind: Option<ComponentKind>,
    pub module: ModuleScope,
    pub name: Option<String>,
}

impl ComponentFilter {
    pub fn of_device(device_id: u64) -> Self {
        Self {
            device_id: Some(device_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn module(mut self, scope: ModuleScope) -> Self {
        self.module = scope;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn matches(&self, component: &Component) -> bool {
        if self.device_id.is_some_and(|id| component.device_id != id) {
            return false;
        }
        if self.kind.is_some_and(|kind| component.kind() != kind) {
            return false;
        }
        let module_ok = match self.module {
            ModuleScope::Any => true,
            ModuleScope::Unassigned => component.module_id.is_none(),
            ModuleScope::Module(id) => component.module_id == Some(id),
        };
        module_ok && self.name.as_ref().is_none_or(|name| &component.name == name)
    }
}

/// IP address query
///
/// `interface_ids` and `nat_inside_ids` are alternatives: an address
/// matches when it satisfies either list. Leaving both unset matches
/// every address of the family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAddressFilter {
    /// 4 or 6
    pub family: Option<u8>,
    pub interface_ids: Option<Vec<u64>>,
    pub nat_inside_ids: Option<Vec<u64>>,
}

impl IpAddressFilter {
    pub fn matches(&self, ip: &IpAddress) -> bool {
        if self.family.is_some() && ip.family() != self.family {
            return false;
        }
        if self.interface_ids.is_none() && self.nat_inside_ids.is_none() {
            return true;
        }
        let on_interface = self
            .interface_ids
            .as_ref()
            .zip(ip.interface_id())
            .is_some_and(|(ids, id)| ids.contains(&id));
        let nat_of = self
            .nat_inside_ids
            .as_ref()
            .zip(ip.nat_inside_id)
            .is_some_and(|(ids, id)| ids.contains(&id));
        on_interface || nat_of
    }
}
