//! Organizational reference entities
//!
//! Sites, locations, platforms and clusters. The core only
//! compares their ownership links, so they carry little more than ids.

use serde::{Deserialize, Serialize};

/// A site (campus, building or data hall)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub id: u64,
    pub name: String,
}

/// A location within a site (room, cage, floor)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub site_id: u64,
}

/// Software platform, optionally limited to one manufacturer's hardware
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Platform {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<u64>,
}

/// Virtualization cluster, optionally bound to a site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<u64>,
}
