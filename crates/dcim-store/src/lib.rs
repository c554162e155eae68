//! DCIM persistence collaborator
//!
//! The core never talks to a database directly. Everything it reads or
//! writes goes through [`DcimStore`], which also owns the transaction
//! boundary around each top-level operation.
//!
//! # Example
//!
//! ```no_run
//! use dcim_store::{DcimStore, DeviceFilter};
//!
//! # async fn example(store: &dyn DcimStore) -> Result<(), dcim_store::StoreError> {
//! let tx = store.begin().await?;
//! let racked = tx.query_devices(&DeviceFilter::in_rack(7).positioned()).await?;
//! println!("{} devices mounted in rack 7", racked.len());
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **test-util**: [`MemoryStore`], an in-memory store with isolated
//!   transactions and the uniqueness constraints a relational backend enforces

pub mod error;
pub mod query;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(feature = "test-util")]
pub mod memory;

pub use error::StoreError;
pub use query::{ComponentFilter, DeviceFilter, IpAddressFilter, ModuleScope};
pub use store_trait::{DcimStore, DcimTransaction};
#[cfg(feature = "test-util")]
pub use memory::MemoryStore;
