//! Choice sets
//!
//! Enumerations used across the DCIM model. Serialized names match the
//! values the surrounding application stores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rack face a device is mounted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum RackFace {
    Front,
    Rear,
}

impl RackFace {
    /// The opposite face of the rack
    pub fn opposite(self) -> RackFace {
        match self {
            RackFace::Front => RackFace::Rear,
            RackFace::Rear => RackFace::Front,
        }
    }
}

impl fmt::Display for RackFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RackFace::Front => write!(f, "front"),
            RackFace::Rear => write!(f, "rear"),
        }
    }
}

/// Parent/child status of a device type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SubdeviceRole {
    /// Houses child devices in device bays
    Parent,
    /// Installed in a parent's device bay; never racked directly
    Child,
}

/// Airflow direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Airflow {
    FrontToRear,
    RearToFront,
    LeftToRight,
    RightToLeft,
    SideToRear,
    Passive,
    Mixed,
}

/// Operational status of a device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceStatus {
    Offline,
    #[default]
    Active,
    Planned,
    Staged,
    Failed,
    Inventory,
    Decommissioning,
}

/// Operational status of a module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    Offline,
    #[default]
    Active,
    Planned,
    Staged,
    Failed,
    Decommissioning,
}

/// Power outlet feed leg (three-phase feeds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FeedLeg {
    A,
    B,
    C,
}

/// Interface type
///
/// Only the types the placement core distinguishes are named; everything
/// else is carried as [`InterfaceType::Other`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "bridge")]
    Bridge,
    #[serde(rename = "lag")]
    Lag,
    #[serde(rename = "1000base-t")]
    #[default]
    Gigabit,
    #[serde(rename = "10gbase-x-sfpp")]
    TenGigSfpPlus,
    #[serde(rename = "25gbase-x-sfp28")]
    TwentyFiveGigSfp28,
    #[serde(rename = "100gbase-x-qsfp28")]
    HundredGigQsfp28,
    #[serde(rename = "ieee802.11ac")]
    Ieee80211ac,
    #[serde(rename = "ieee802.11ax")]
    Ieee80211ax,
    #[serde(rename = "other")]
    Other,
}

impl InterfaceType {
    /// Virtual, bridge and LAG interfaces have no physical presence
    pub fn is_virtual(&self) -> bool {
        matches!(self, InterfaceType::Virtual | InterfaceType::Bridge | InterfaceType::Lag)
    }

    pub fn is_wireless(&self) -> bool {
        matches!(self, InterfaceType::Ieee80211ac | InterfaceType::Ieee80211ax)
    }
}

/// The kinds of device component (and component template)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    ConsolePort,
    ConsoleServerPort,
    PowerPort,
    PowerOutlet,
    Interface,
    FrontPort,
    RearPort,
    ModuleBay,
    DeviceBay,
    InventoryItem,
}

impl ComponentKind {
    /// Order in which a new device's components are instantiated.
    /// Power ports precede outlets and rear ports precede front ports so
    /// that references can be resolved by name.
    pub const DEVICE_ORDER: [ComponentKind; 10] = [
        ComponentKind::ConsolePort,
        ComponentKind::ConsoleServerPort,
        ComponentKind::PowerPort,
        ComponentKind::PowerOutlet,
        ComponentKind::Interface,
        ComponentKind::RearPort,
        ComponentKind::FrontPort,
        ComponentKind::ModuleBay,
        ComponentKind::DeviceBay,
        ComponentKind::InventoryItem,
    ];

    /// Kinds a module type can carry, in module population order
    pub const MODULAR: [ComponentKind; 7] = [
        ComponentKind::ConsolePort,
        ComponentKind::ConsoleServerPort,
        ComponentKind::Interface,
        ComponentKind::PowerPort,
        ComponentKind::PowerOutlet,
        ComponentKind::RearPort,
        ComponentKind::FrontPort,
    ];

    /// Whether components of this kind may belong to a module
    pub fn is_modular(self) -> bool {
        Self::MODULAR.contains(&self)
    }

    /// Human-readable name used in messages
    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::ConsolePort => "console port",
            ComponentKind::ConsoleServerPort => "console server port",
            ComponentKind::PowerPort => "power port",
            ComponentKind::PowerOutlet => "power outlet",
            ComponentKind::Interface => "interface",
            ComponentKind::FrontPort => "front port",
            ComponentKind::RearPort => "rear port",
            ComponentKind::ModuleBay => "module bay",
            ComponentKind::DeviceBay => "device bay",
            ComponentKind::InventoryItem => "inventory item",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
