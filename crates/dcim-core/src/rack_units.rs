//! Rack unit space
//!
//! A rack is modelled as half-unit slots: slot `k` is position `k / 2`, so a
//! 42U rack has slots 2..=85 (positions 1 through 42.5). A device at
//! position `p` with height `h` occupies the slots of `[p, p + h)` on its
//! face, or on both faces when it is full depth.

use dcim_models::{Rack, RackFace, Units};
use serde::Serialize;
use std::ops::Range;

const FIRST_SLOT: u32 = 2;

/// Per-face occupancy of one rack
#[derive(Debug, Clone)]
pub struct RackUnitSpace {
    desc_units: bool,
    slot_end: u32,
    front: Vec<Option<u64>>,
    rear: Vec<Option<u64>>,
    reserved: Vec<bool>,
}

/// One row of a rack elevation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElevationUnit {
    pub position: Units,
    /// Device occupying this unit on the requested face
    pub occupant: Option<u64>,
    pub reserved: bool,
}

fn slot_range(position: Units, u_height: Units) -> Range<u32> {
    let start = position.half_units_floor();
    start..start.saturating_add(u_height.half_units_ceil())
}

impl RackUnitSpace {
    /// Empty space for a rack
    pub fn new(rack: &Rack) -> Self {
        let slot_end = rack.slot_end();
        let len = slot_end as usize;
        Self {
            desc_units: rack.desc_units,
            slot_end,
            front: vec![None; len],
            rear: vec![None; len],
            reserved: vec![false; len],
        }
    }

    fn slots(&self) -> Range<u32> {
        FIRST_SLOT..self.slot_end
    }

    fn in_rack(&self, slot: u32) -> bool {
        self.slots().contains(&slot)
    }

    /// Mark a device's units as used. A device without a face, or a full
    /// depth one, takes both faces. Units outside the rack are ignored and an
    /// overlapping slot keeps its first occupant.
    pub fn occupy(
        &mut self,
        device_id: u64,
        position: Units,
        u_height: Units,
        face: Option<RackFace>,
        is_full_depth: bool,
    ) {
        let (front, rear) = match (face, is_full_depth) {
            (_, true) | (None, _) => (true, true),
            (Some(RackFace::Front), false) => (true, false),
            (Some(RackFace::Rear), false) => (false, true),
        };
        let slots = self.slots();
        for slot in slot_range(position, u_height).filter(|s| slots.contains(s)) {
            let i = slot as usize;
            if front && self.front[i].is_none() {
                self.front[i] = Some(device_id);
            }
            if rear && self.rear[i].is_none() {
                self.rear[i] = Some(device_id);
            }
        }
    }

    /// Mark a whole reserved unit
    pub fn reserve(&mut self, unit: u32) {
        let first = unit.saturating_mul(2);
        for slot in [first, first.saturating_add(1)] {
            if self.in_rack(slot) {
                self.reserved[slot as usize] = true;
            }
        }
    }

    fn occupant_at(&self, slot: u32, face: RackFace) -> Option<u64> {
        if !self.in_rack(slot) {
            return None;
        }
        match face {
            RackFace::Front => self.front[slot as usize],
            RackFace::Rear => self.rear[slot as usize],
        }
    }

    /// Device occupying a position on one face
    pub fn occupant(&self, position: Units, face: RackFace) -> Option<u64> {
        self.occupant_at(position.half_units_floor(), face)
    }

    /// `face == None` asks for both faces
    fn is_free(&self, slot: u32, face: Option<RackFace>) -> bool {
        match face {
            Some(face) => self.occupant_at(slot, face).is_none(),
            None => self.occupant_at(slot, RackFace::Front).is_none() && self.occupant_at(slot, RackFace::Rear).is_none(),
        }
    }

    /// Whether a device of `u_height` fits with its lowest unit at `position`
    pub fn fits(&self, position: Units, u_height: Units, face: Option<RackFace>) -> bool {
        if !position.is_half_aligned() || !self.in_rack(position.half_units_floor()) {
            return false;
        }
        let mut range = slot_range(position, u_height);
        range.end <= self.slot_end && range.all(|slot| self.is_free(slot, face))
    }

    /// Start positions where a device of `u_height` fits, in the reverse of
    /// the rack's display order. A 0U height fits everywhere.
    pub fn available_units(&self, u_height: Units, face: Option<RackFace>) -> Vec<Units> {
        let mut units: Vec<Units> = self
            .slots()
            .map(Units::from_half_units)
            .filter(|position| u_height.is_zero() || self.fits(*position, u_height, face))
            .collect();
        if self.desc_units {
            units.reverse();
        }
        units
    }

    /// Devices standing in the way of a placement, in slot order
    pub fn blockers(&self, position: Units, u_height: Units, face: Option<RackFace>) -> Vec<u64> {
        let faces: &[RackFace] = match face {
            Some(RackFace::Front) => &[RackFace::Front],
            Some(RackFace::Rear) => &[RackFace::Rear],
            None => &[RackFace::Front, RackFace::Rear],
        };
        let mut blockers = Vec::new();
        for slot in slot_range(position, u_height) {
            for face in faces {
                if let Some(id) = self.occupant_at(slot, *face)
                    && !blockers.contains(&id)
                {
                    blockers.push(id);
                }
            }
        }
        blockers
    }

    /// Share of half-unit slots that are occupied on either face or reserved, as a percentage
    pub fn utilization(&self) -> f64 {
        let total = self.slots().len();
        if total == 0 {
            return 0.0;
        }
        let used = self
            .slots()
            .filter(|slot| !self.is_free(*slot, None) || self.reserved[*slot as usize])
            .count();
        #[allow(clippy::cast_precision_loss, reason = "slot counts are far below 2^52")]
        let ratio = used as f64 / total as f64;
        ratio * 100.0
    }

    /// Every position on one face, in display order
    pub fn elevation(&self, face: RackFace) -> Vec<ElevationUnit> {
        let mut rows: Vec<ElevationUnit> = self
            .slots()
            .map(|slot| ElevationUnit {
                position: Units::from_half_units(slot),
                occupant: self.occupant_at(slot, face),
                reserved: self.reserved[slot as usize],
            })
            .collect();
        if !self.desc_units {
            rows.reverse();
        }
        rows
    }
}
