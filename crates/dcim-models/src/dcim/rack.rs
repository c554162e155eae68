//! Racks and rack reservations

use crate::units::Units;
use serde::{Deserialize, Serialize};

fn default_u_height() -> u32 {
    42
}

/// A rack: a vertical stack of mounting units with a front and a rear face
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rack {
    pub id: u64,
    pub name: String,
    pub site_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u64>,

    /// Height in whole rack units
    #[serde(default = "default_u_height")]
    pub u_height: u32,

    /// Units are numbered top-to-bottom
    #[serde(default)]
    pub desc_units: bool,
}

impl Rack {
    /// Every half-unit position in the rack, `1, 1.5, …, u_height + 0.5`,
    /// ordered for display: top first unless units are numbered descending.
    pub fn units(&self) -> Vec<Units> {
        let mut units: Vec<Units> = (2..self.slot_end()).map(Units::from_half_units).collect();
        if !self.desc_units {
            units.reverse();
        }
        units
    }

    /// Number of half-unit slots in the rack
    pub fn slot_count(&self) -> u32 {
        self.u_height.saturating_mul(2)
    }

    /// Exclusive upper bound of slot indices (slot `k` is position `k / 2`)
    pub fn slot_end(&self) -> u32 {
        self.u_height.saturating_add(1).saturating_mul(2)
    }

    /// Whether a half-unit position exists in this rack
    pub fn has_unit(&self, position: Units) -> bool {
        position.is_half_aligned() && (2..self.slot_end()).contains(&position.half_units_floor())
    }
}

/// One or more whole units reserved within a rack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RackReservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub rack_id: u64,
    pub units: Vec<u32>,
    #[serde(default)]
    pub description: String,
}
