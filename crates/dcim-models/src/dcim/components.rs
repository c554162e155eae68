//! Device components
//!
//! Concrete ports, interfaces, bays and inventory items owned by a device
//! and, for modular kinds, optionally by a module installed in it.

use crate::choices::{ComponentKind, FeedLeg, InterfaceType};
use serde::{Deserialize, Serialize};

/// A component instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Component {
    /// Unset until the component is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub device_id: u64,

    /// Owning module; `None` marks a device-native component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<u64>,

    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    pub data: ComponentData,
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    pub fn as_interface(&self) -> Option<&InterfaceData> {
        match &self.data {
            ComponentData::Interface(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_interface_mut(&mut self) -> Option<&mut InterfaceData> {
        match &mut self.data {
            ComponentData::Interface(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_device_bay(&self) -> Option<&DeviceBayData> {
        match &self.data {
            ComponentData::DeviceBay(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_module_bay(&self) -> Option<&ModuleBayData> {
        match &self.data {
            ComponentData::ModuleBay(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_inventory_item(&self) -> Option<&InventoryItemData> {
        match &self.data {
            ComponentData::InventoryItem(data) => Some(data),
            _ => None,
        }
    }
}

/// Kind-specific component attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComponentData {
    ConsolePort(PortData),
    ConsoleServerPort(PortData),
    PowerPort(PowerPortData),
    PowerOutlet(PowerOutletData),
    Interface(InterfaceData),
    FrontPort(FrontPortData),
    RearPort(RearPortData),
    ModuleBay(ModuleBayData),
    DeviceBay(DeviceBayData),
    InventoryItem(InventoryItemData),
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentData::ConsolePort(_) => ComponentKind::ConsolePort,
            ComponentData::ConsoleServerPort(_) => ComponentKind::ConsoleServerPort,
            ComponentData::PowerPort(_) => ComponentKind::PowerPort,
            ComponentData::PowerOutlet(_) => ComponentKind::PowerOutlet,
            ComponentData::Interface(_) => ComponentKind::Interface,
            ComponentData::FrontPort(_) => ComponentKind::FrontPort,
            ComponentData::RearPort(_) => ComponentKind::RearPort,
            ComponentData::ModuleBay(_) => ComponentKind::ModuleBay,
            ComponentData::DeviceBay(_) => ComponentKind::DeviceBay,
            ComponentData::InventoryItem(_) => ComponentKind::InventoryItem,
        }
    }
}

/// Console and console-server port attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PortData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
}

/// Power port draw, in watts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PowerPortData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_draw: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_draw: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PowerOutletData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_type: Option<String>,
    /// Upstream power port on the same device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_port_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_leg: Option<FeedLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceData {
    #[serde(default, rename = "type")]
    pub iface_type: InterfaceType,
    #[serde(default)]
    pub mgmt_only: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<u64>,
    /// Parent LAG interface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_id: Option<u64>,
    /// Parent interface (virtual sub-interfaces)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl Default for InterfaceData {
    fn default() -> Self {
        Self {
            iface_type: InterfaceType::default(),
            mgmt_only: false,
            enabled: true,
            bridge_id: None,
            lag_id: None,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrontPortData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    pub rear_port_id: u64,
    #[serde(default = "default_position")]
    pub rear_port_position: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RearPortData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    /// Number of front ports which may be mapped
    #[serde(default = "default_position")]
    pub positions: u16,
}

impl Default for RearPortData {
    fn default() -> Self {
        Self {
            port_type: None,
            positions: 1,
        }
    }
}

fn default_position() -> u16 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModuleBayData {
    /// Identifier substituted for `{module}` in installed module component names
    #[serde(default)]
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeviceBayData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_device_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InventoryItemData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    /// The single component this item is attached to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<u64>,
    #[serde(default)]
    pub part_id: String,
}

/// Reference to exactly one modular component
///
/// Within a template the id refers to another template of the same owner;
/// within a component it refers to a component of the same device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentRef {
    ConsolePort(u64),
    ConsoleServerPort(u64),
    PowerPort(u64),
    PowerOutlet(u64),
    Interface(u64),
    FrontPort(u64),
    RearPort(u64),
}

impl ComponentRef {
    /// Build a reference; `None` for kinds that cannot be referenced
    pub fn new(kind: ComponentKind, id: u64) -> Option<Self> {
        match kind {
            ComponentKind::ConsolePort => Some(ComponentRef::ConsolePort(id)),
            ComponentKind::ConsoleServerPort => Some(ComponentRef::ConsoleServerPort(id)),
            ComponentKind::PowerPort => Some(ComponentRef::PowerPort(id)),
            ComponentKind::PowerOutlet => Some(ComponentRef::PowerOutlet(id)),
            ComponentKind::Interface => Some(ComponentRef::Interface(id)),
            ComponentKind::FrontPort => Some(ComponentRef::FrontPort(id)),
            ComponentKind::RearPort => Some(ComponentRef::RearPort(id)),
            ComponentKind::ModuleBay | ComponentKind::DeviceBay | ComponentKind::InventoryItem => None,
        }
    }

    pub fn kind(self) -> ComponentKind {
        match self {
            ComponentRef::ConsolePort(_) => ComponentKind::ConsolePort,
            ComponentRef::ConsoleServerPort(_) => ComponentKind::ConsoleServerPort,
            ComponentRef::PowerPort(_) => ComponentKind::PowerPort,
            ComponentRef::PowerOutlet(_) => ComponentKind::PowerOutlet,
            ComponentRef::Interface(_) => ComponentKind::Interface,
            ComponentRef::FrontPort(_) => ComponentKind::FrontPort,
            ComponentRef::RearPort(_) => ComponentKind::RearPort,
        }
    }

    pub fn id(self) -> u64 {
        match self {
            ComponentRef::ConsolePort(id)
            | ComponentRef::ConsoleServerPort(id)
            | ComponentRef::PowerPort(id)
            | ComponentRef::PowerOutlet(id)
            | ComponentRef::Interface(id)
            | ComponentRef::FrontPort(id)
            | ComponentRef::RearPort(id) => id,
        }
    }
}
