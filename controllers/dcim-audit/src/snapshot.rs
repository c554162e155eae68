//! YAML snapshot of a DCIM inventory
//!
//! A snapshot lists records by type. Loading inserts them into a
//! [`MemoryStore`] in dependency order, so the store's own integrity checks
//! (unknown device types, occupied bays, duplicate positions) surface as
//! load errors rather than audit findings.

use anyhow::{Context, Result};
use dcim_models::*;
use dcim_store::MemoryStore;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub sites: Vec<Site>,
    pub locations: Vec<Location>,
    pub platforms: Vec<Platform>,
    pub clusters: Vec<Cluster>,
    pub racks: Vec<Rack>,
    pub rack_reservations: Vec<RackReservation>,
    pub device_types: Vec<DeviceType>,
    pub module_types: Vec<ModuleType>,
    pub templates: Vec<ComponentTemplate>,
    pub virtual_chassis: Vec<VirtualChassis>,
    pub devices: Vec<Device>,
    pub modules: Vec<Module>,
    pub components: Vec<Component>,
    pub ip_addresses: Vec<IpAddress>,
}

impl Snapshot {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Insert every record into a fresh store
    ///
    /// Components not owned by a module go in before modules, since a module
    /// needs its bay; module-owned components follow.
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for site in self.sites {
            store.add_site(site).context("Failed to load site")?;
        }
        for location in self.locations {
            store.add_location(location).context("Failed to load location")?;
        }
        for platform in self.platforms {
            store.add_platform(platform).context("Failed to load platform")?;
        }
        for cluster in self.clusters {
            store.add_cluster(cluster).context("Failed to load cluster")?;
        }
        for rack in self.racks {
            let name = rack.name.clone();
            store.add_rack(rack).with_context(|| format!("Failed to load rack {}", name))?;
        }
        for reservation in self.rack_reservations {
            store
                .add_rack_reservation(reservation)
                .context("Failed to load rack reservation")?;
        }
        for device_type in self.device_types {
            let model = device_type.model.clone();
            store
                .add_device_type(device_type)
                .with_context(|| format!("Failed to load device type {}", model))?;
        }
        for module_type in self.module_types {
            let model = module_type.model.clone();
            store
                .add_module_type(module_type)
                .with_context(|| format!("Failed to load module type {}", model))?;
        }
        for template in self.templates {
            let name = template.name.clone();
            store
                .add_template(template)
                .with_context(|| format!("Failed to load template {}", name))?;
        }
        for virtual_chassis in self.virtual_chassis {
            let name = virtual_chassis.name.clone();
            store
                .add_virtual_chassis(virtual_chassis)
                .with_context(|| format!("Failed to load virtual chassis {}", name))?;
        }
        let device_count = self.devices.len();
        for device in self.devices {
            let identifier = device.identifier();
            store
                .add_device(device)
                .with_context(|| format!("Failed to load device {}", identifier))?;
        }

        let (owned, unowned): (Vec<Component>, Vec<Component>) =
            self.components.into_iter().partition(|c| c.module_id.is_some());
        for component in unowned {
            let name = component.name.clone();
            store
                .add_component(component)
                .with_context(|| format!("Failed to load component {}", name))?;
        }
        for module in self.modules {
            store.add_module(module).context("Failed to load module")?;
        }
        for component in owned {
            let name = component.name.clone();
            store
                .add_component(component)
                .with_context(|| format!("Failed to load module component {}", name))?;
        }
        debug!("Loaded {} components", store.components()?.len());

        for ip in self.ip_addresses {
            let address = ip.address.clone();
            store
                .add_ip_address(ip)
                .with_context(|| format!("Failed to load IP address {}", address))?;
        }
        info!("Loaded snapshot with {} devices", device_count);
        Ok(store)
    }
}
