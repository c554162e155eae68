//! IP addresses
//!
//! Only what primary-IP validation needs: the address, what it is
//! assigned to, and its NAT inside address.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// The single object an IP address is assigned to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AssignedObject {
    /// A device interface component
    Interface(u64),
    /// A virtual machine interface
    VmInterface(u64),
    /// A first-hop redundancy group
    FhrpGroup(u64),
}

impl AssignedObject {
    /// The device interface id, when assigned to one
    pub fn interface_id(self) -> Option<u64> {
        match self {
            AssignedObject::Interface(id) => Some(id),
            AssignedObject::VmInterface(_) | AssignedObject::FhrpGroup(_) => None,
        }
    }
}

/// IP address model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpAddress {
    pub id: u64,

    /// Address with prefix length, e.g. "192.168.1.1/24"
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_object: Option<AssignedObject>,

    /// The inside address this address is NAT-mapped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_inside_id: Option<u64>,
}

impl IpAddress {
    /// 4 or 6; `None` when the address does not parse
    pub fn family(&self) -> Option<u8> {
        let host = self.address.split('/').next().unwrap_or_default();
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Some(4),
            Ok(IpAddr::V6(_)) => Some(6),
            Err(_) => None,
        }
    }

    pub fn interface_id(&self) -> Option<u64> {
        self.assigned_object.and_then(AssignedObject::interface_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(address: &str) -> IpAddress {
        IpAddress {
            id: 1,
            address: address.to_string(),
            assigned_object: Some(AssignedObject::Interface(5)),
            nat_inside_id: None,
        }
    }

    #[test]
    fn test_family() {
        assert_eq!(ip("10.0.0.1/24").family(), Some(4));
        assert_eq!(ip("2001:db8::1/64").family(), Some(6));
        assert_eq!(ip("not-an-ip").family(), None);
    }

    #[test]
    fn test_interface_id() {
        assert_eq!(ip("10.0.0.1/24").interface_id(), Some(5));
        let mut vm = ip("10.0.0.2/24");
        vm.assigned_object = Some(AssignedObject::VmInterface(5));
        assert_eq!(vm.interface_id(), None);
    }
}
