//! DCIM Model Definitions
//!
//! Plain data types for the rack placement and component instantiation core:
//! organizational references, racks, device and module types, component
//! templates, devices, modules, virtual chassis, components and IP addresses.
//!
//! Every type is serde-serializable so the surrounding application (or a
//! snapshot file) can hand already-parsed data to the core.

pub mod choices;
pub mod dcim;
pub mod ipam;
pub mod units;

pub use choices::*;
pub use dcim::*;
pub use ipam::*;
pub use units::{Units, UnitsError};
