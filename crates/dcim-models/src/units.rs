//! Rack unit quantities
//!
//! Rack heights and positions are decimals with one decimal place. Valid
//! values sit on a 0.5U grid, but the type can carry any tenth so that a
//! misaligned value reaches validation and is reported there instead of
//! being silently rounded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use thiserror::Error;

const TENTHS_PER_UNIT: u32 = 10;
const TENTHS_PER_HALF: u32 = 5;

/// Errors raised when converting a raw number into [`Units`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    /// Negative, NaN or infinite input
    #[error("Rack units must be a finite, non-negative number (got {0})")]
    Invalid(String),

    /// More than one decimal place
    #[error("Rack units support at most one decimal place (got {0})")]
    TooPrecise(String),

    /// Larger than the representable range
    #[error("Rack units value {0} is out of range")]
    OutOfRange(String),
}

/// A rack-unit quantity stored in tenths of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Units(u32);

impl Units {
    /// 0U
    pub const ZERO: Units = Units(0);
    /// Half a rack unit, the placement granularity
    pub const HALF: Units = Units(TENTHS_PER_HALF);
    /// One rack unit
    pub const ONE: Units = Units(TENTHS_PER_UNIT);

    /// Build from tenths of a unit (e.g. `15` is 1.5U)
    pub const fn from_tenths(tenths: u32) -> Self {
        Units(tenths)
    }

    /// Build from a whole number of units
    pub const fn whole(units: u32) -> Self {
        Units(units.saturating_mul(TENTHS_PER_UNIT))
    }

    /// Build from a number of half-unit slots
    pub const fn from_half_units(halves: u32) -> Self {
        Units(halves.saturating_mul(TENTHS_PER_HALF))
    }

    pub const fn tenths(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when the value is a multiple of 0.5U
    pub const fn is_half_aligned(self) -> bool {
        self.0 % TENTHS_PER_HALF == 0
    }

    /// Half-unit slots covered by this quantity, rounding a partial slot up
    pub const fn half_units_ceil(self) -> u32 {
        self.0.div_ceil(TENTHS_PER_HALF)
    }

    /// Index of the half-unit slot this position falls in
    pub const fn half_units_floor(self) -> u32 {
        self.0 / TENTHS_PER_HALF
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(TENTHS_PER_UNIT)
    }

    pub fn saturating_sub(self, rhs: Units) -> Units {
        Units(self.0.saturating_sub(rhs.0))
    }
}

impl TryFrom<f64> for Units {
    type Error = UnitsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(UnitsError::Invalid(value.to_string()));
        }
        let scaled = value * f64::from(TENTHS_PER_UNIT);
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(UnitsError::TooPrecise(value.to_string()));
        }
        if rounded > f64::from(u32::MAX) {
            return Err(UnitsError::OutOfRange(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "range checked above")]
        let tenths = rounded as u32;
        Ok(Units(tenths))
    }
}

impl From<Units> for f64 {
    fn from(units: Units) -> Self {
        units.as_f64()
    }
}

impl Add for Units {
    type Output = Units;

    fn add(self, rhs: Units) -> Units {
        Units(self.0.saturating_add(rhs.0))
    }
}


impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TENTHS_PER_UNIT;
        let frac = self.0 % TENTHS_PER_UNIT;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{}", whole, frac)
        }
    }
}
