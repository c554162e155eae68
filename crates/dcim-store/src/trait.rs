//! DcimStore trait
//!
//! Persistence abstraction for the DCIM core. A relational backend and the
//! in-memory test store both implement it.

use crate::error::StoreError;
use crate::query::{ComponentFilter, DeviceFilter, IpAddressFilter};
use dcim_models::*;

/// Trait for DCIM persistence operations
///
/// Writes made through the store itself apply immediately. Writes made
/// through a handle returned by `begin` stay private to that handle until
/// it commits.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait DcimStore: Send + Sync {
    /// Open a transaction scoped to the returned handle
    ///
    /// Transactions do not nest: calling `begin` on a transaction handle
    /// fails with [`StoreError::Transaction`].
    async fn begin(&self) -> Result<Box<dyn DcimTransaction>, StoreError>;

    // Organization
    async fn get_site(&self, id: u64) -> Result<Site, StoreError>;
    async fn get_location(&self, id: u64) -> Result<Location, StoreError>;
    async fn get_platform(&self, id: u64) -> Result<Platform, StoreError>;
    async fn get_cluster(&self, id: u64) -> Result<Cluster, StoreError>;

    // Racks
    async fn get_rack(&self, id: u64) -> Result<Rack, StoreError>;
    async fn query_racks(&self) -> Result<Vec<Rack>, StoreError>;
    async fn query_rack_reservations(&self, rack_id: u64) -> Result<Vec<RackReservation>, StoreError>;

    // Device types, module types and their templates
    async fn get_device_type(&self, id: u64) -> Result<DeviceType, StoreError>;
    async fn update_device_type(&self, device_type: &DeviceType) -> Result<DeviceType, StoreError>;
    async fn get_module_type(&self, id: u64) -> Result<ModuleType, StoreError>;
    async fn query_templates(&self, owner: TemplateOwner, kind: Option<ComponentKind>) -> Result<Vec<ComponentTemplate>, StoreError>;

    // Devices
    async fn get_device(&self, id: u64) -> Result<Device, StoreError>;
    async fn query_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>, StoreError>;
    async fn create_device(&self, device: Device) -> Result<Device, StoreError>;
    async fn update_device(&self, device: &Device) -> Result<Device, StoreError>;
    /// Deletes the device with its components and modules
    async fn delete_device(&self, id: u64) -> Result<(), StoreError>;

    // Modules
    async fn get_module(&self, id: u64) -> Result<Module, StoreError>;
    async fn query_modules(&self, device_id: u64) -> Result<Vec<Module>, StoreError>;
    async fn create_module(&self, module: Module) -> Result<Module, StoreError>;
    /// Deletes the module with the components it owns
    async fn delete_module(&self, id: u64) -> Result<(), StoreError>;

    // Virtual chassis
    async fn get_virtual_chassis(&self, id: u64) -> Result<VirtualChassis, StoreError>;
    async fn query_virtual_chassis(&self) -> Result<Vec<VirtualChassis>, StoreError>;
    async fn create_virtual_chassis(&self, virtual_chassis: VirtualChassis) -> Result<VirtualChassis, StoreError>;
    async fn update_virtual_chassis(&self, virtual_chassis: &VirtualChassis) -> Result<VirtualChassis, StoreError>;
    /// Deletes the chassis and clears membership of its devices
    async fn delete_virtual_chassis(&self, id: u64) -> Result<(), StoreError>;

    // Components
    async fn get_component(&self, id: u64) -> Result<Component, StoreError>;
    async fn query_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>, StoreError>;
    async fn create_component(&self, component: Component) -> Result<Component, StoreError>;
    /// All-or-nothing insert; returns the components with ids assigned, in input order
    async fn bulk_create_components(&self, components: Vec<Component>) -> Result<Vec<Component>, StoreError>;
    async fn update_component(&self, component: &Component) -> Result<Component, StoreError>;
    /// All-or-nothing update of already saved components
    async fn bulk_update_components(&self, components: &[Component]) -> Result<(), StoreError>;

    // IPAM
    async fn get_ip_address(&self, id: u64) -> Result<IpAddress, StoreError>;
    async fn query_ip_addresses(&self, filter: &IpAddressFilter) -> Result<Vec<IpAddress>, StoreError>;
}

/// An open transaction
///
/// Reads through the handle see its own uncommitted writes. Other handles
/// see them only after `commit` succeeds. Dropping the handle without
/// committing discards its writes.
#[async_trait::async_trait]
pub trait DcimTransaction: DcimStore {
    /// The handle as a plain store, for code written against [`DcimStore`]
    fn as_store(&self) -> &dyn DcimStore;

    /// Publish every write made through this handle
    ///
    /// Fails with [`StoreError::Transaction`] when a record this handle
    /// changed was changed by another transaction since `begin`. Nothing is
    /// published in that case.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write made through this handle
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

impl std::fmt::Debug for dyn DcimTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcimTransaction").finish_non_exhaustive()
    }
}
