//! Test utilities
//!
//! [`Fixture`] wraps a seeded [`MemoryStore`] with one site and helpers that
//! add racks, types, templates, devices and components with a single call.
//! Helpers panic on seeding failures; they are only meant for tests.

use crate::config::Settings;
use crate::notify::RecordingObserver;
use crate::service::DcimService;
use dcim_models::*;
use dcim_store::{DcimStore, MemoryStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Seeded ids start here, clear of ids the store generates for small tests
const FIRST_SEEDED_ID: u64 = 1000;

/// A memory store with a default site and seeding helpers
pub struct Fixture {
    pub store: MemoryStore,
    pub observer: RecordingObserver,
    pub site: Site,
    next_id: AtomicU64,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let observer = RecordingObserver::watching(store.clone());
        let site = store
            .add_site(Site {
                id: FIRST_SEEDED_ID,
                name: "dc1".to_string(),
            })
            .unwrap();
        Self {
            store,
            observer,
            site,
            next_id: AtomicU64::new(FIRST_SEEDED_ID + 1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Service over this fixture's store and observer with default settings
    pub fn service(&self) -> DcimService {
        self.service_with(Settings::default())
    }

    pub fn service_with(&self, settings: Settings) -> DcimService {
        DcimService::new(Arc::new(self.store.clone()), Arc::new(self.observer.clone()), settings)
    }

    pub fn add_site(&self, name: &str) -> Site {
        self.store
            .add_site(Site {
                id: self.next_id(),
                name: name.to_string(),
            })
            .unwrap()
    }

    pub fn location(&self, site: &Site, name: &str) -> Location {
        self.store
            .add_location(Location {
                id: self.next_id(),
                name: name.to_string(),
                site_id: site.id,
            })
            .unwrap()
    }

    pub fn platform(&self, manufacturer_id: Option<u64>) -> Platform {
        let id = self.next_id();
        self.store
            .add_platform(Platform {
                id,
                name: format!("platform-{}", id),
                manufacturer_id,
            })
            .unwrap()
    }

    pub fn cluster(&self, site_id: Option<u64>) -> Cluster {
        let id = self.next_id();
        self.store
            .add_cluster(Cluster {
                id,
                name: format!("cluster-{}", id),
                site_id,
            })
            .unwrap()
    }

    /// Rack in the default site
    pub fn rack(&self, u_height: u32) -> Rack {
        self.rack_in(&self.site, None, u_height)
    }

    pub fn rack_in(&self, site: &Site, location_id: Option<u64>, u_height: u32) -> Rack {
        let id = self.next_id();
        self.store
            .add_rack(Rack {
                id,
                name: format!("R{}", id),
                site_id: site.id,
                location_id,
                u_height,
                desc_units: false,
            })
            .unwrap()
    }

    pub fn reservation(&self, rack: &Rack, units: &[u32]) -> RackReservation {
        self.store
            .add_rack_reservation(RackReservation {
                id: None,
                rack_id: rack.id,
                units: units.to_vec(),
                description: String::new(),
            })
            .unwrap()
    }

    /// Device type from manufacturer 1 with no subdevice role
    pub fn device_type(&self, model: &str, u_height: Units, is_full_depth: bool) -> DeviceType {
        self.add_device_type(DeviceType {
            id: None,
            manufacturer_id: 1,
            model: model.to_string(),
            slug: model.to_lowercase().replace(' ', "-"),
            default_platform_id: None,
            u_height,
            is_full_depth,
            subdevice_role: None,
            airflow: None,
        })
    }

    pub fn add_device_type(&self, device_type: DeviceType) -> DeviceType {
        self.store.add_device_type(device_type).unwrap()
    }

    pub fn module_type(&self, model: &str) -> ModuleType {
        self.store
            .add_module_type(ModuleType {
                id: self.next_id(),
                manufacturer_id: 1,
                model: model.to_string(),
            })
            .unwrap()
    }

    pub fn template(&self, owner: TemplateOwner, name: &str, kind: TemplateKind) -> ComponentTemplate {
        self.store
            .add_template(ComponentTemplate {
                id: self.next_id(),
                owner,
                name: name.to_string(),
                label: String::new(),
                description: String::new(),
                kind,
            })
            .unwrap()
    }

    /// Unracked device in the default site, stored without components
    pub fn device(&self, device_type: &DeviceType) -> Device {
        let device = Device::new(device_type.id.unwrap(), 1, self.site.id);
        self.store.add_device(device).unwrap()
    }

    /// Device stored at a rack position, without components
    pub fn racked_device(&self, device_type: &DeviceType, rack: &Rack, position: u32, face: RackFace) -> Device {
        let mut device = Device::new(device_type.id.unwrap(), 1, rack.site_id);
        device.rack_id = Some(rack.id);
        device.location_id = rack.location_id;
        device.position = Some(Units::whole(position));
        device.face = Some(face);
        self.store.add_device(device).unwrap()
    }

    pub async fn save_device(&self, device: &Device) -> Device {
        self.store.update_device(device).await.unwrap()
    }

    pub fn component(&self, device: &Device, module_id: Option<u64>, name: &str, data: ComponentData) -> Component {
        self.store
            .add_component(Component {
                id: None,
                device_id: device.id.unwrap(),
                module_id,
                name: name.to_string(),
                label: String::new(),
                description: String::new(),
                data,
            })
            .unwrap()
    }

    pub fn interface(&self, device: &Device, name: &str) -> Component {
        self.component(device, None, name, ComponentData::Interface(InterfaceData::default()))
    }

    pub fn module_bay(&self, device: &Device, name: &str, position: &str) -> Component {
        self.component(
            device,
            None,
            name,
            ComponentData::ModuleBay(ModuleBayData {
                position: position.to_string(),
            }),
        )
    }

    pub fn device_bay(&self, device: &Device, name: &str) -> Component {
        self.component(device, None, name, ComponentData::DeviceBay(DeviceBayData::default()))
    }

    pub fn virtual_chassis(&self, name: &str, master_id: Option<u64>) -> VirtualChassis {
        self.store
            .add_virtual_chassis(VirtualChassis {
                id: None,
                name: name.to_string(),
                domain: String::new(),
                master_id,
            })
            .unwrap()
    }

    /// Make a stored device a member of a chassis
    pub async fn join_chassis(&self, device: &Device, virtual_chassis: &VirtualChassis, position: u8) -> Device {
        let mut member = device.clone();
        member.virtual_chassis_id = virtual_chassis.id;
        member.vc_position = Some(position);
        self.save_device(&member).await
    }

    pub fn ip(&self, address: &str, assigned_object: Option<AssignedObject>, nat_inside_id: Option<u64>) -> IpAddress {
        self.store
            .add_ip_address(IpAddress {
                id: self.next_id(),
                address: address.to_string(),
                assigned_object,
                nat_inside_id,
            })
            .unwrap()
    }
}
