//! DCIM entities

pub mod components;
pub mod device;
pub mod device_type;
pub mod organization;
pub mod rack;
pub mod templates;

pub use components::*;
pub use device::*;
pub use device_type::*;
pub use organization::*;
pub use rack::*;
pub use templates::*;
