//! Run every record-level validation against a loaded store

use dcim_core::components::clean_component;
use dcim_core::device::clean_device;
use dcim_core::module::clean_module;
use dcim_core::rack::{clean_rack, clean_reservation, rack_utilization};
use dcim_core::virtual_chassis::clean_virtual_chassis;
use dcim_core::{DcimError, Settings, ValidationErrors};
use dcim_store::{ComponentFilter, DcimStore, DeviceFilter};
use std::fmt;
use tracing::{debug, info};

/// Failed validation for one record
#[derive(Debug)]
pub struct Violation {
    pub object: String,
    pub errors: ValidationErrors,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.object, self.errors)
    }
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub checked: usize,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    fn record(&mut self, object: impl FnOnce() -> String, errors: ValidationErrors) {
        self.checked += 1;
        if !errors.is_empty() {
            self.violations.push(Violation { object: object(), errors });
        }
    }
}

pub async fn audit(store: &dyn DcimStore, settings: &Settings) -> Result<AuditReport, DcimError> {
    let mut report = AuditReport::default();

    for rack in store.query_racks().await? {
        let errors = clean_rack(store, &rack, true, settings).await?;
        report.record(|| format!("rack {}", rack.name), errors);
        for reservation in store.query_rack_reservations(rack.id).await? {
            let errors = clean_reservation(store, &reservation).await?;
            report.record(|| format!("reservation on rack {}", rack.name), errors);
        }
        info!("Rack {} is {:.1}% utilized", rack.name, rack_utilization(store, &rack).await?);
    }

    for device in store.query_devices(&DeviceFilter::default()).await? {
        let errors = clean_device(store, &device, settings).await?;
        report.record(|| format!("device {}", device.identifier()), errors);

        let Some(device_id) = device.id else { continue };
        for module in store.query_modules(device_id).await? {
            let errors = clean_module(store, &module).await?;
            report.record(
                || format!("module {} in device {}", module.id.unwrap_or_default(), device.identifier()),
                errors,
            );
        }
        for component in store.query_components(&ComponentFilter::of_device(device_id)).await? {
            let errors = clean_component(store, Some(&component), &component).await?;
            report.record(|| format!("{} on device {}", component.name, device.identifier()), errors);
        }
    }

    for virtual_chassis in store.query_virtual_chassis().await? {
        let errors = clean_virtual_chassis(store, &virtual_chassis).await?;
        report.record(|| format!("virtual chassis {}", virtual_chassis.name), errors);
    }

    debug!("Checked {} records", report.checked);
    Ok(report)
}
