//! Device types and module types

use crate::choices::{Airflow, SubdeviceRole};
use crate::units::Units;
use serde::{Deserialize, Serialize};

fn default_u_height() -> Units {
    Units::ONE
}

fn default_is_full_depth() -> bool {
    true
}

/// A make and model of device
///
/// Declares rack height and depth, and owns the component templates from
/// which every instance's components are created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceType {
    /// Unset until the type is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub manufacturer_id: u64,

    /// Model name (e.g. "EX4300-48T")
    pub model: String,

    pub slug: String,

    /// Platform inherited by new devices that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_platform_id: Option<u64>,

    /// Height in rack units (default: 1.0)
    #[serde(default = "default_u_height")]
    pub u_height: Units,

    /// Device consumes both front and rear rack faces (default: true)
    #[serde(default = "default_is_full_depth")]
    pub is_full_depth: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdevice_role: Option<SubdeviceRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airflow: Option<Airflow>,
}

impl DeviceType {
    pub fn is_parent_device(&self) -> bool {
        self.subdevice_role == Some(SubdeviceRole::Parent)
    }

    pub fn is_child_device(&self) -> bool {
        self.subdevice_role == Some(SubdeviceRole::Child)
    }
}

/// A make and model of field-replaceable module (line card, PSU, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleType {
    pub id: u64,
    pub manufacturer_id: u64,
    pub model: String,
}
