//! Devices, modules and virtual chassis

use crate::choices::{Airflow, DeviceStatus, ModuleStatus, RackFace};
use crate::units::Units;
use serde::{Deserialize, Serialize};

/// A piece of physical hardware, optionally mounted in a rack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    /// Unset until the device is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub device_type_id: u64,
    pub device_role_id: u64,
    pub site_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<u64>,

    /// Lowest-numbered unit occupied by the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Units>,

    /// Rack face; `None` is a blank face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<RackFace>,

    #[serde(default)]
    pub status: DeviceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airflow: Option<Airflow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ip4_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_ip6_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_chassis_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_position: Option<u8>,

    /// Master election priority within the virtual chassis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_priority: Option<u8>,
}

impl Device {
    /// Minimal unracked device; the remaining fields start empty
    pub fn new(device_type_id: u64, device_role_id: u64, site_id: u64) -> Self {
        Self {
            id: None,
            name: None,
            device_type_id,
            device_role_id,
            site_id,
            location_id: None,
            rack_id: None,
            position: None,
            face: None,
            status: DeviceStatus::default(),
            airflow: None,
            platform_id: None,
            primary_ip4_id: None,
            primary_ip6_id: None,
            cluster_id: None,
            virtual_chassis_id: None,
            vc_position: None,
            vc_priority: None,
        }
    }

    /// Name if set, otherwise `{id}`
    pub fn identifier(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("{{{}}}", id),
            (None, None) => "{new}".to_string(),
        }
    }
}

/// A field-replaceable module installed in a device's module bay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    /// Unset until the module is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub device_id: u64,

    /// Module bay component; holds at most one module
    pub module_bay_id: u64,

    pub module_type_id: u64,

    #[serde(default)]
    pub status: ModuleStatus,

    #[serde(default)]
    pub serial: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<String>,
}

/// Devices sharing one control plane (e.g. a switch stack)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VirtualChassis {
    /// Unset until the chassis is saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_falls_back_to_id() {
        let mut device = Device::new(1, 1, 1);
        assert_eq!(device.identifier(), "{new}");
        device.id = Some(17);
        assert_eq!(device.identifier(), "{17}");
        device.name = Some("core-sw1".to_string());
        assert_eq!(device.identifier(), "core-sw1");
    }

    #[test]
    fn test_device_yaml_position_and_face() {
        let yaml = "device_type_id: 3\ndevice_role_id: 1\nsite_id: 1\nrack_id: 2\nposition: 40\nface: rear\n";
        let device: Device = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(device.position, Some(Units::whole(40)));
        assert_eq!(device.face, Some(RackFace::Rear));
        assert_eq!(device.status, DeviceStatus::Active);
    }
}
