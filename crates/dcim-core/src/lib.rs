//! DCIM Placement and Component Instantiation Core
//!
//! Validates where devices go in racks, builds a device's components from
//! its device type's templates, populates modules (creating or adopting
//! components) and widens a device's interfaces to its virtual chassis.
//!
//! Persistence is delegated to a [`dcim_store::DcimStore`] and change
//! announcements to a [`notify::ChangeObserver`]. [`DcimService`] wraps
//! both and runs each operation in one transaction.
//!
//! # Example
//!
//! ```no_run
//! use dcim_core::{DcimService, Settings};
//! use dcim_core::notify::TracingObserver;
//! use dcim_models::{Device, RackFace, Units};
//! use dcim_store::DcimStore;
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<dyn DcimStore>) -> Result<(), dcim_core::DcimError> {
//! let service = DcimService::new(store, Arc::new(TracingObserver), Settings::from_env()?);
//!
//! let mut device = Device::new(4, 1, 1);
//! device.name = Some("leaf01".to_string());
//! device.rack_id = Some(7);
//! device.position = Some(Units::whole(20));
//! device.face = Some(RackFace::Front);
//! let device = service.create_device(device).await?;
//! println!("Created {}", device.identifier());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **test-util**: [`test_utils::Fixture`] and
//!   [`notify::RecordingObserver`] for tests in dependent crates

pub mod components;
pub mod config;
pub mod device;
pub mod device_type;
pub mod error;
pub mod instantiate;
pub mod module;
pub mod naming;
pub mod notify;
pub mod placement;
pub mod rack;
pub mod rack_units;
pub mod service;
pub mod template_set;
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;
pub mod virtual_chassis;

#[cfg(test)]
mod instantiate_test;

pub use config::Settings;
pub use error::{DcimError, ErrorCategory, FieldError, NON_FIELD_ERRORS, ValidationErrors};
pub use module::{ModuleInstallOptions, PopulationMode, PopulationReport};
pub use notify::{ChangeAction, ChangeEvent, ChangeObserver, EventBuffer, ObjectKind, TracingObserver};
pub use placement::available_units;
pub use rack_units::{ElevationUnit, RackUnitSpace};
pub use service::DcimService;
pub use service::module::InstalledModule;
pub use template_set::TemplateSet;
