//! In-memory DcimStore
//!
//! Stores every record in ordered maps behind one lock, so queries return
//! records in id order and repeated runs are deterministic. `begin` hands out
//! a handle holding a private copy of the state; reads and writes through the
//! handle use that copy. `commit` merges the records the handle changed back
//! into the shared state and fails if another commit touched the same records
//! first. Ids come from one sequence shared by every copy, so records created
//! in concurrent transactions never collide.
//!
//! The store is organized like the trait:
//! - `dcim.rs` - racks, types, templates, devices, modules, virtual chassis, components
//! - `ipam.rs` - IP addresses

mod dcim;
mod ipam;

use crate::error::StoreError;
use crate::query::{ComponentFilter, DeviceFilter, IpAddressFilter};
use crate::store_trait::{DcimStore, DcimTransaction};
use dcim_models::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub(crate) sites: BTreeMap<u64, Site>,
    pub(crate) locations: BTreeMap<u64, Location>,
    pub(crate) platforms: BTreeMap<u64, Platform>,
    pub(crate) clusters: BTreeMap<u64, Cluster>,
    pub(crate) racks: BTreeMap<u64, Rack>,
    pub(crate) reservations: BTreeMap<u64, RackReservation>,
    pub(crate) device_types: BTreeMap<u64, DeviceType>,
    pub(crate) module_types: BTreeMap<u64, ModuleType>,
    pub(crate) templates: BTreeMap<u64, ComponentTemplate>,
    pub(crate) devices: BTreeMap<u64, Device>,
    pub(crate) modules: BTreeMap<u64, Module>,
    pub(crate) virtual_chassis: BTreeMap<u64, VirtualChassis>,
    pub(crate) components: BTreeMap<u64, Component>,
    pub(crate) ip_addresses: BTreeMap<u64, IpAddress>,
    // Last generated id; clones share it
    last_id: Arc<AtomicU64>,
}

/// Ids whose record differs between two copies of a table
fn changed_ids<T: PartialEq>(base: &BTreeMap<u64, T>, work: &BTreeMap<u64, T>) -> Vec<u64> {
    base.keys()
        .chain(work.keys().filter(|id| !base.contains_key(*id)))
        .filter(|id| base.get(*id) != work.get(*id))
        .copied()
        .collect()
}

fn first_conflict<T: PartialEq>(shared: &BTreeMap<u64, T>, base: &BTreeMap<u64, T>, changed: &[u64]) -> Option<u64> {
    changed.iter().copied().find(|id| shared.get(id) != base.get(id))
}

fn apply_changes<T: Clone>(shared: &mut BTreeMap<u64, T>, work: &BTreeMap<u64, T>, changed: &[u64]) {
    for id in changed {
        match work.get(id) {
            Some(record) => shared.insert(*id, record.clone()),
            None => shared.remove(id),
        };
    }
}

impl MemoryState {
    pub(crate) fn allocate_id(&mut self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Keep generated ids clear of an explicitly seeded one
    pub(crate) fn reserve_id(&mut self, id: u64) -> u64 {
        self.last_id.fetch_max(id, Ordering::SeqCst);
        id
    }

    pub(crate) fn id_or_allocate(&mut self, id: Option<u64>) -> u64 {
        match id {
            Some(id) => self.reserve_id(id),
            None => self.allocate_id(),
        }
    }

    /// Apply the difference between `base` and `work` to this state
    ///
    /// Checks every table before touching any, so a conflict leaves this
    /// state unchanged.
    fn merge(&mut self, base: &MemoryState, work: &MemoryState) -> Result<usize, StoreError> {
        let shared = self;
        macro_rules! merge_tables {
            ($($table:ident),+) => {{
                $(
                    let $table = changed_ids(&base.$table, &work.$table);
                    if let Some(id) = first_conflict(&shared.$table, &base.$table, &$table) {
                        return Err(StoreError::Transaction(format!(
                            "{} record {} was changed by another transaction",
                            stringify!($table),
                            id
                        )));
                    }
                )+
                let mut count = 0;
                $(
                    count += $table.len();
                    apply_changes(&mut shared.$table, &work.$table, &$table);
                )+
                count
            }};
        }

        Ok(merge_tables!(
            sites,
            locations,
            platforms,
            clusters,
            racks,
            reservations,
            device_types,
            module_types,
            templates,
            devices,
            modules,
            virtual_chassis,
            components,
            ip_addresses
        ))
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    current: MemoryState,
    open_transactions: usize,
}

/// Private copy of the state held by a transaction handle
#[derive(Debug)]
struct Pending {
    shared: Arc<Mutex<MemoryInner>>,
    base: MemoryState,
    work: MemoryState,
}

impl Drop for Pending {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.shared.lock() {
            inner.open_transactions = inner.open_transactions.saturating_sub(1);
        }
    }
}

/// In-memory store for tests and offline audits
///
/// Clones share the same underlying state. A handle returned by `begin` is
/// itself a `MemoryStore` whose reads and writes go to its private copy.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
    pending: Option<Arc<Mutex<Pending>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::Backend(format!("memory store lock poisoned: {}", e)))
}

fn not_found(what: &str, id: u64) -> StoreError {
    StoreError::NotFound(format!("{} {} not found", what, id))
}

fn get_cloned<T: Clone>(map: &BTreeMap<u64, T>, what: &str, id: u64) -> Result<T, StoreError> {
    map.get(&id).cloned().ok_or_else(|| not_found(what, id))
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        match &self.pending {
            Some(pending) => f(&mut lock(pending)?.work),
            None => f(&mut lock(&self.inner)?.current),
        }
    }

    /// Number of transaction handles not yet committed, rolled back or dropped
    pub fn transaction_depth(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.inner)?.open_transactions)
    }

    fn pending(&self) -> Result<&Arc<Mutex<Pending>>, StoreError> {
        self.pending
            .as_ref()
            .ok_or_else(|| StoreError::Transaction("not inside a transaction".to_string()))
    }

    /// Whether a component with this id is currently stored
    pub fn component_exists(&self, id: u64) -> bool {
        self.with_state(|state| Ok(state.components.contains_key(&id)))
            .unwrap_or(false)
    }

    /// Every stored component, in id order
    pub fn components(&self) -> Result<Vec<Component>, StoreError> {
        self.with_state(|state| Ok(state.components.values().cloned().collect()))
    }

    // Seeding helpers. Records keep the ids they are given.

    pub fn add_site(&self, site: Site) -> Result<Site, StoreError> {
        self.with_state(|state| {
            state.reserve_id(site.id);
            state.sites.insert(site.id, site.clone());
            Ok(site)
        })
    }

    pub fn add_location(&self, location: Location) -> Result<Location, StoreError> {
        self.with_state(|state| {
            state.reserve_id(location.id);
            state.locations.insert(location.id, location.clone());
            Ok(location)
        })
    }

    pub fn add_platform(&self, platform: Platform) -> Result<Platform, StoreError> {
        self.with_state(|state| {
            state.reserve_id(platform.id);
            state.platforms.insert(platform.id, platform.clone());
            Ok(platform)
        })
    }

    pub fn add_cluster(&self, cluster: Cluster) -> Result<Cluster, StoreError> {
        self.with_state(|state| {
            state.reserve_id(cluster.id);
            state.clusters.insert(cluster.id, cluster.clone());
            Ok(cluster)
        })
    }

    pub fn add_rack(&self, rack: Rack) -> Result<Rack, StoreError> {
        self.with_state(|state| {
            state.reserve_id(rack.id);
            state.racks.insert(rack.id, rack.clone());
            Ok(rack)
        })
    }

    pub fn add_rack_reservation(&self, mut reservation: RackReservation) -> Result<RackReservation, StoreError> {
        self.with_state(|state| {
            let id = state.id_or_allocate(reservation.id);
            reservation.id = Some(id);
            state.reservations.insert(id, reservation.clone());
            Ok(reservation)
        })
    }

    pub fn add_device_type(&self, mut device_type: DeviceType) -> Result<DeviceType, StoreError> {
        self.with_state(|state| {
            let id = state.id_or_allocate(device_type.id);
            device_type.id = Some(id);
            state.device_types.insert(id, device_type.clone());
            Ok(device_type)
        })
    }

    pub fn add_module_type(&self, module_type: ModuleType) -> Result<ModuleType, StoreError> {
        self.with_state(|state| {
            state.reserve_id(module_type.id);
            state.module_types.insert(module_type.id, module_type.clone());
            Ok(module_type)
        })
    }

    pub fn add_template(&self, template: ComponentTemplate) -> Result<ComponentTemplate, StoreError> {
        if !template.owner_is_valid() {
            return Err(StoreError::IntegrityViolation(format!(
                "module types cannot own {} templates",
                template.component_kind()
            )));
        }
        self.with_state(|state| {
            state.reserve_id(template.id);
            state.templates.insert(template.id, template.clone());
            Ok(template)
        })
    }

    /// Insert a device as-is, enforcing the same constraints as `create_device`
    pub fn add_device(&self, device: Device) -> Result<Device, StoreError> {
        self.with_state(|state| dcim::insert_device(state, device))
    }

    pub fn add_module(&self, module: Module) -> Result<Module, StoreError> {
        self.with_state(|state| dcim::insert_module(state, module))
    }

    pub fn add_virtual_chassis(&self, mut virtual_chassis: VirtualChassis) -> Result<VirtualChassis, StoreError> {
        self.with_state(|state| {
            let id = state.id_or_allocate(virtual_chassis.id);
            virtual_chassis.id = Some(id);
            state.virtual_chassis.insert(id, virtual_chassis.clone());
            Ok(virtual_chassis)
        })
    }

    pub fn add_component(&self, component: Component) -> Result<Component, StoreError> {
        self.with_state(|state| dcim::insert_components(state, vec![component]))
            .and_then(|mut created| created.pop().ok_or_else(|| StoreError::Backend("component insert returned nothing".to_string())))
    }

    pub fn add_ip_address(&self, ip: IpAddress) -> Result<IpAddress, StoreError> {
        self.with_state(|state| {
            state.reserve_id(ip.id);
            state.ip_addresses.insert(ip.id, ip.clone());
            Ok(ip)
        })
    }
}

#[async_trait::async_trait]
impl DcimStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn DcimTransaction>, StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::Transaction("nested transactions are not supported".to_string()));
        }
        let base = {
            let mut inner = lock(&self.inner)?;
            inner.open_transactions += 1;
            debug!("Opened transaction ({} open)", inner.open_transactions);
            inner.current.clone()
        };
        let pending = Pending {
            shared: Arc::clone(&self.inner),
            work: base.clone(),
            base,
        };
        Ok(Box::new(MemoryStore {
            inner: Arc::clone(&self.inner),
            pending: Some(Arc::new(Mutex::new(pending))),
        }))
    }

    async fn get_site(&self, id: u64) -> Result<Site, StoreError> {
        self.with_state(|state| get_cloned(&state.sites, "Site", id))
    }

    async fn get_location(&self, id: u64) -> Result<Location, StoreError> {
        self.with_state(|state| get_cloned(&state.locations, "Location", id))
    }

    async fn get_platform(&self, id: u64) -> Result<Platform, StoreError> {
        self.with_state(|state| get_cloned(&state.platforms, "Platform", id))
    }

    async fn get_cluster(&self, id: u64) -> Result<Cluster, StoreError> {
        self.with_state(|state| get_cloned(&state.clusters, "Cluster", id))
    }

    async fn get_rack(&self, id: u64) -> Result<Rack, StoreError> {
        self.with_state(|state| get_cloned(&state.racks, "Rack", id))
    }

    async fn query_racks(&self) -> Result<Vec<Rack>, StoreError> {
        self.with_state(|state| Ok(state.racks.values().cloned().collect()))
    }

    async fn query_rack_reservations(&self, rack_id: u64) -> Result<Vec<RackReservation>, StoreError> {
        self.with_state(|state| {
            Ok(state
                .reservations
                .values()
                .filter(|r| r.rack_id == rack_id)
                .cloned()
                .collect())
        })
    }

    async fn get_device_type(&self, id: u64) -> Result<DeviceType, StoreError> {
        self.with_state(|state| get_cloned(&state.device_types, "Device type", id))
    }

    async fn update_device_type(&self, device_type: &DeviceType) -> Result<DeviceType, StoreError> {
        self.with_state(|state| dcim::update_device_type(state, device_type))
    }

    async fn get_module_type(&self, id: u64) -> Result<ModuleType, StoreError> {
        self.with_state(|state| get_cloned(&state.module_types, "Module type", id))
    }

    async fn query_templates(&self, owner: TemplateOwner, kind: Option<ComponentKind>) -> Result<Vec<ComponentTemplate>, StoreError> {
        self.with_state(|state| Ok(dcim::query_templates(state, owner, kind)))
    }

    async fn get_device(&self, id: u64) -> Result<Device, StoreError> {
        self.with_state(|state| get_cloned(&state.devices, "Device", id))
    }

    async fn query_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>, StoreError> {
        self.with_state(|state| Ok(state.devices.values().filter(|d| filter.matches(d)).cloned().collect()))
    }

    async fn create_device(&self, mut device: Device) -> Result<Device, StoreError> {
        device.id = None;
        self.with_state(|state| dcim::insert_device(state, device))
    }

    async fn update_device(&self, device: &Device) -> Result<Device, StoreError> {
        self.with_state(|state| dcim::update_device(state, device))
    }

    async fn delete_device(&self, id: u64) -> Result<(), StoreError> {
        self.with_state(|state| dcim::delete_device(state, id))
    }

    async fn get_module(&self, id: u64) -> Result<Module, StoreError> {
        self.with_state(|state| get_cloned(&state.modules, "Module", id))
    }

    async fn query_modules(&self, device_id: u64) -> Result<Vec<Module>, StoreError> {
        self.with_state(|state| {
            Ok(state
                .modules
                .values()
                .filter(|m| m.device_id == device_id)
                .cloned()
                .collect())
        })
    }

    async fn create_module(&self, mut module: Module) -> Result<Module, StoreError> {
        module.id = None;
        self.with_state(|state| dcim::insert_module(state, module))
    }

    async fn delete_module(&self, id: u64) -> Result<(), StoreError> {
        self.with_state(|state| dcim::delete_module(state, id))
    }

    async fn get_virtual_chassis(&self, id: u64) -> Result<VirtualChassis, StoreError> {
        self.with_state(|state| get_cloned(&state.virtual_chassis, "Virtual chassis", id))
    }

    async fn query_virtual_chassis(&self) -> Result<Vec<VirtualChassis>, StoreError> {
        self.with_state(|state| Ok(state.virtual_chassis.values().cloned().collect()))
    }

    async fn create_virtual_chassis(&self, mut virtual_chassis: VirtualChassis) -> Result<VirtualChassis, StoreError> {
        self.with_state(|state| {
            let id = state.allocate_id();
            virtual_chassis.id = Some(id);
            state.virtual_chassis.insert(id, virtual_chassis.clone());
            Ok(virtual_chassis)
        })
    }

    async fn update_virtual_chassis(&self, virtual_chassis: &VirtualChassis) -> Result<VirtualChassis, StoreError> {
        self.with_state(|state| dcim::update_virtual_chassis(state, virtual_chassis))
    }

    async fn delete_virtual_chassis(&self, id: u64) -> Result<(), StoreError> {
        self.with_state(|state| dcim::delete_virtual_chassis(state, id))
    }

    async fn get_component(&self, id: u64) -> Result<Component, StoreError> {
        self.with_state(|state| get_cloned(&state.components, "Component", id))
    }

    async fn query_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>, StoreError> {
        self.with_state(|state| Ok(state.components.values().filter(|c| filter.matches(c)).cloned().collect()))
    }

    async fn create_component(&self, mut component: Component) -> Result<Component, StoreError> {
        component.id = None;
        let mut created = self.with_state(|state| dcim::insert_components(state, vec![component]))?;
        created
            .pop()
            .ok_or_else(|| StoreError::Backend("component insert returned nothing".to_string()))
    }

    async fn bulk_create_components(&self, mut components: Vec<Component>) -> Result<Vec<Component>, StoreError> {
        for component in &mut components {
            component.id = None;
        }
        self.with_state(|state| dcim::insert_components(state, components))
    }

    async fn update_component(&self, component: &Component) -> Result<Component, StoreError> {
        self.with_state(|state| {
            dcim::update_components(state, std::slice::from_ref(component))?;
            Ok(component.clone())
        })
    }

    async fn bulk_update_components(&self, components: &[Component]) -> Result<(), StoreError> {
        self.with_state(|state| dcim::update_components(state, components))
    }

    async fn get_ip_address(&self, id: u64) -> Result<IpAddress, StoreError> {
        self.with_state(|state| get_cloned(&state.ip_addresses, "IP address", id))
    }

    async fn query_ip_addresses(&self, filter: &IpAddressFilter) -> Result<Vec<IpAddress>, StoreError> {
        self.with_state(|state| Ok(ipam::query_ip_addresses(state, filter)))
    }
}

#[async_trait::async_trait]
impl DcimTransaction for MemoryStore {
    fn as_store(&self) -> &dyn DcimStore {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let pending = lock(self.pending()?)?;
        let mut inner = lock(&self.inner)?;
        let changed = inner.current.merge(&pending.base, &pending.work)?;
        debug!("Committed transaction ({} records changed)", changed);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.pending()?;
        debug!("Rolled back transaction");
        Ok(())
    }
}
