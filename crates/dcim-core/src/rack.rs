//! Rack validation, reservations, utilization and elevations

use crate::config::Settings;
use crate::error::{DcimError, ValidationErrors};
use crate::placement::{rack_unit_space, rack_unit_space_with_reservations};
use crate::rack_units::ElevationUnit;
use dcim_models::*;
use dcim_store::{DcimStore, DeviceFilter};
use std::collections::BTreeSet;

/// Validate a rack; `existing` racks must still hold their devices
pub async fn clean_rack(
    store: &dyn DcimStore,
    rack: &Rack,
    existing: bool,
    settings: &Settings,
) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();

    if let Some(location_id) = rack.location_id {
        let location = store.get_location(location_id).await?;
        if location.site_id != rack.site_id {
            let site = store.get_site(rack.site_id).await?;
            errors.referential(
                "location",
                format!("Assigned location must belong to parent site ({}).", site.name),
            );
        }
    }

    if rack.u_height < 1 {
        errors.placement("u_height", "Ensure this value is greater than or equal to 1.");
    } else if rack.u_height > settings.rack_u_height_max {
        errors.placement(
            "u_height",
            format!("Ensure this value is less than or equal to {}.", settings.rack_u_height_max),
        );
    } else if existing {
        let mut top = Units::ZERO;
        for device in store.query_devices(&DeviceFilter::in_rack(rack.id).positioned()).await? {
            let Some(position) = device.position else { continue };
            let device_type = store.get_device_type(device.device_type_id).await?;
            top = top.max(position + device_type.u_height);
        }
        let min_height = top.saturating_sub(Units::ONE);
        if Units::whole(rack.u_height) < min_height {
            errors.placement(
                "u_height",
                format!(
                    "Rack must be at least {}U tall to house currently installed devices.",
                    min_height
                ),
            );
        }
    }
    Ok(errors)
}

fn unit_list(units: &BTreeSet<u32>) -> String {
    units.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

/// Reserved units must exist in the rack and not be reserved already
pub async fn clean_reservation(store: &dyn DcimStore, reservation: &RackReservation) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();
    let rack = store.get_rack(reservation.rack_id).await?;

    let invalid: BTreeSet<u32> = reservation
        .units
        .iter()
        .copied()
        .filter(|unit| *unit < 1 || *unit > rack.u_height)
        .collect();
    if !invalid.is_empty() {
        errors.referential(
            "units",
            format!("Invalid unit(s) for {}U rack: {}", rack.u_height, unit_list(&invalid)),
        );
    }

    let reserved: BTreeSet<u32> = store
        .query_rack_reservations(rack.id)
        .await?
        .into_iter()
        .filter(|other| reservation.id.is_none() || other.id != reservation.id)
        .flat_map(|other| other.units)
        .collect();
    let conflicts: BTreeSet<u32> = reservation
        .units
        .iter()
        .copied()
        .filter(|unit| reserved.contains(unit))
        .collect();
    if !conflicts.is_empty() {
        errors.referential(
            "units",
            format!("The following units have already been reserved: {}", unit_list(&conflicts)),
        );
    }
    Ok(errors)
}

/// Share of the rack's half-unit slots that are occupied or reserved, in percent
pub async fn rack_utilization(store: &dyn DcimStore, rack: &Rack) -> Result<f64, DcimError> {
    Ok(rack_unit_space_with_reservations(store, rack).await?.utilization())
}

/// One face of the rack in display order
pub async fn rack_elevation(
    store: &dyn DcimStore,
    rack: &Rack,
    face: RackFace,
    exclude: &[u64],
) -> Result<Vec<ElevationUnit>, DcimError> {
    let mut space = rack_unit_space(store, rack, exclude).await?;
    for reservation in store.query_rack_reservations(rack.id).await? {
        for unit in reservation.units {
            space.reserve(unit);
        }
    }
    Ok(space.elevation(face))
}
