//! Component templates
//!
//! A template describes one component (or, through a range pattern in its
//! name, several) that every device or module of the owning type receives
//! when it is created.

use crate::choices::{ComponentKind, FeedLeg, InterfaceType};
use crate::dcim::components::{ComponentRef, ModuleBayData, PortData, PowerPortData, RearPortData};
use serde::{Deserialize, Serialize};

/// Placeholder in a template name replaced by the module bay position
pub const MODULE_TOKEN: &str = "{module}";

/// The type a template belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateOwner {
    DeviceType(u64),
    ModuleType(u64),
}

/// A component template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentTemplate {
    pub id: u64,
    pub owner: TemplateOwner,

    /// Name; may contain [`MODULE_TOKEN`] and range patterns such as `[1-48]`
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    pub kind: TemplateKind,
}

impl ComponentTemplate {
    pub fn component_kind(&self) -> ComponentKind {
        self.kind.component_kind()
    }

    /// Whether this template's name depends on the module bay position
    pub fn has_module_token(&self) -> bool {
        self.name.contains(MODULE_TOKEN)
    }

    /// Module types may only own modular kinds
    pub fn owner_is_valid(&self) -> bool {
        match self.owner {
            TemplateOwner::DeviceType(_) => true,
            TemplateOwner::ModuleType(_) => self.component_kind().is_modular(),
        }
    }
}

/// Kind-specific template attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TemplateKind {
    ConsolePort(PortData),
    ConsoleServerPort(PortData),
    PowerPort(PowerPortData),
    PowerOutlet(PowerOutletTemplateData),
    Interface(InterfaceTemplateData),
    FrontPort(FrontPortTemplateData),
    RearPort(RearPortData),
    ModuleBay(ModuleBayData),
    DeviceBay,
    InventoryItem(InventoryItemTemplateData),
}

impl TemplateKind {
    pub fn component_kind(&self) -> ComponentKind {
        match self {
            TemplateKind::ConsolePort(_) => ComponentKind::ConsolePort,
            TemplateKind::ConsoleServerPort(_) => ComponentKind::ConsoleServerPort,
            TemplateKind::PowerPort(_) => ComponentKind::PowerPort,
            TemplateKind::PowerOutlet(_) => ComponentKind::PowerOutlet,
            TemplateKind::Interface(_) => ComponentKind::Interface,
            TemplateKind::FrontPort(_) => ComponentKind::FrontPort,
            TemplateKind::RearPort(_) => ComponentKind::RearPort,
            TemplateKind::ModuleBay(_) => ComponentKind::ModuleBay,
            TemplateKind::DeviceBay => ComponentKind::DeviceBay,
            TemplateKind::InventoryItem(_) => ComponentKind::InventoryItem,
        }
    }
}

/// Power outlet template; the power port is another template of the same owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PowerOutletTemplateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_port_template_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_leg: Option<FeedLeg>,
}

/// Interface template; the bridge is another interface template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceTemplateData {
    #[serde(default, rename = "type")]
    pub iface_type: InterfaceType,
    #[serde(default)]
    pub mgmt_only: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_template_id: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl Default for InterfaceTemplateData {
    fn default() -> Self {
        Self {
            iface_type: InterfaceType::default(),
            mgmt_only: false,
            enabled: true,
            bridge_template_id: None,
        }
    }
}

/// Front port template mapped onto a rear port template position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrontPortTemplateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    pub rear_port_template_id: u64,
    #[serde(default = "default_rear_port_position")]
    pub rear_port_position: u16,
}

fn default_rear_port_position() -> u16 {
    1
}

/// Inventory item template; may nest under a parent inventory item template
/// and may point at one modular component template of the same owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InventoryItemTemplateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_template_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<u64>,
    #[serde(default)]
    pub part_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(owner: TemplateOwner, kind: TemplateKind) -> ComponentTemplate {
        ComponentTemplate {
            id: 1,
            owner,
            name: "Bay 1".to_string(),
            label: String::new(),
            description: String::new(),
            kind,
        }
    }

    #[test]
    fn test_module_type_cannot_own_bays() {
        let bay = template(TemplateOwner::ModuleType(3), TemplateKind::DeviceBay);
        assert!(!bay.owner_is_valid());
        let bay = template(TemplateOwner::DeviceType(3), TemplateKind::DeviceBay);
        assert!(bay.owner_is_valid());
        let iface = template(TemplateOwner::ModuleType(3), TemplateKind::Interface(InterfaceTemplateData::default()));
        assert!(iface.owner_is_valid());
    }

    #[test]
    fn test_template_kind_tagged_json() {
        let json = r#"{"id":7,"owner":{"device-type":2},"name":"eth[0-3]","kind":{"kind":"interface","type":"10gbase-x-sfpp","mgmt_only":true}}"#;
        let t: ComponentTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.component_kind(), ComponentKind::Interface);
        match t.kind {
            TemplateKind::Interface(data) => {
                assert!(data.mgmt_only);
                assert!(data.enabled, "enabled defaults to true");
                assert_eq!(data.iface_type, InterfaceType::TenGigSfpPlus);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }
}
