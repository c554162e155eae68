//! Device validation and save defaults

use crate::config::Settings;
use crate::error::{DcimError, ErrorCategory, ValidationErrors};
use crate::placement::{rack_unit_space, required_face};
use crate::virtual_chassis::vc_interfaces;
use dcim_models::*;
use dcim_store::DcimStore;
use std::collections::HashSet;

/// Validate a device before it is saved
///
/// Every check runs and contributes at most one error, so the caller sees
/// all problems at once. Records the device points at must exist.
pub async fn clean_device(store: &dyn DcimStore, device: &Device, settings: &Settings) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();
    let site = store.get_site(device.site_id).await?;
    let rack = match device.rack_id {
        Some(id) => Some(store.get_rack(id).await?),
        None => None,
    };
    let location = match device.location_id {
        Some(id) => Some(store.get_location(id).await?),
        None => None,
    };
    let device_type = store.get_device_type(device.device_type_id).await?;

    // Site, location and rack agree
    if let Some(rack) = &rack
        && rack.site_id != device.site_id
    {
        errors.referential("rack", format!("Rack {} does not belong to site {}.", rack.name, site.name));
    }
    if let Some(location) = &location
        && location.site_id != device.site_id
    {
        errors.referential(
            "location",
            format!("Location {} does not belong to site {}.", location.name, site.name),
        );
    }
    if let (Some(rack), Some(location)) = (&rack, &location)
        && rack.location_id != Some(location.id)
    {
        errors.referential(
            "rack",
            format!("Rack {} does not belong to location {}.", rack.name, location.name),
        );
    }

    if rack.is_none() {
        if device.face.is_some() {
            errors.placement("face", "Cannot select a rack face without assigning a rack.");
        }
        if device.position.is_some() {
            errors.placement("position", "Cannot select a rack position without assigning a rack.");
        }
    }

    let mut position_valid = false;
    if let Some(position) = device.position {
        let max = Units::whole(settings.rack_u_height_max) + Units::HALF;
        if !position.is_half_aligned() {
            errors.placement("position", "Position must be in increments of 0.5 rack units.");
        } else if position < Units::ONE {
            errors.placement("position", "Ensure this value is greater than or equal to 1.");
        } else if position > max {
            errors.placement("position", format!("Ensure this value is less than or equal to {}.", max));
        } else {
            position_valid = true;
        }
        if device.face.is_none() {
            errors.placement("face", "Must specify rack face when defining rack position.");
        }
        if device_type.u_height.is_zero() {
            errors.placement(
                "position",
                format!(
                    "A U0 device type ({}) cannot be assigned to a rack position.",
                    device_type.model
                ),
            );
        }
    }

    if device_type.is_child_device() {
        if device.face.is_some() {
            errors.placement(
                "face",
                "Child device types cannot be assigned to a rack face. This is an attribute of the parent device.",
            );
        }
        if device.position.is_some() {
            errors.placement(
                "position",
                "Child device types cannot be assigned to a rack position. This is an attribute of the parent device.",
            );
        }
    }

    // Rack space, ignoring the device's own current placement
    if let (Some(rack), Some(position), true) = (&rack, device.position, position_valid)
        && !device_type.u_height.is_zero()
    {
        let exclude: Vec<u64> = device.id.into_iter().collect();
        let space = rack_unit_space(store, rack, &exclude).await?;
        let face = required_face(device.face, &device_type);
        if !space.fits(position, device_type.u_height, face) {
            errors.add_with_objects(
                "position",
                ErrorCategory::Placement,
                format!(
                    "U{} is already occupied or does not have sufficient space to accommodate this device type: {} ({}U)",
                    position, device_type.model, device_type.u_height
                ),
                space.blockers(position, device_type.u_height, face),
            );
        }
    }

    check_primary_ips(store, device, &mut errors).await?;

    if let Some(platform_id) = device.platform_id {
        let platform = store.get_platform(platform_id).await?;
        if let Some(manufacturer_id) = platform.manufacturer_id
            && manufacturer_id != device_type.manufacturer_id
        {
            errors.referential(
                "platform",
                format!(
                    "The assigned platform is limited to manufacturer {} device types, but this device's type belongs to manufacturer {}.",
                    manufacturer_id, device_type.manufacturer_id
                ),
            );
        }
    }

    if let Some(cluster_id) = device.cluster_id {
        let cluster = store.get_cluster(cluster_id).await?;
        if let Some(cluster_site_id) = cluster.site_id
            && cluster_site_id != device.site_id
        {
            let cluster_site = store.get_site(cluster_site_id).await?;
            errors.referential(
                "cluster",
                format!("The assigned cluster belongs to a different site ({})", cluster_site.name),
            );
        }
    }

    if device.virtual_chassis_id.is_some() && device.vc_position.is_none() {
        errors.placement(
            "vc_position",
            "A device assigned to a virtual chassis must have its position defined.",
        );
    }

    Ok(errors)
}

/// Primary addresses: right family, and owned by the device or a chassis
/// member directly or through their NAT inside address
async fn check_primary_ips(store: &dyn DcimStore, device: &Device, errors: &mut ValidationErrors) -> Result<(), DcimError> {
    if device.primary_ip4_id.is_none() && device.primary_ip6_id.is_none() {
        return Ok(());
    }
    let local: HashSet<u64> = vc_interfaces(store, device, false)
        .await?
        .into_iter()
        .filter_map(|c| c.id)
        .collect();

    for (field, family, ip_id) in [
        ("primary_ip4", 4u8, device.primary_ip4_id),
        ("primary_ip6", 6u8, device.primary_ip6_id),
    ] {
        let Some(ip_id) = ip_id else { continue };
        let ip = store.get_ip_address(ip_id).await?;
        if ip.family() != Some(family) {
            errors.referential(field, format!("{} is not an IPv{} address.", ip.address, family));
            continue;
        }
        let owned_directly = ip.interface_id().is_some_and(|id| local.contains(&id));
        let owned_via_nat = match ip.nat_inside_id {
            Some(inside_id) if !owned_directly => store
                .get_ip_address(inside_id)
                .await?
                .interface_id()
                .is_some_and(|id| local.contains(&id)),
            _ => false,
        };
        if !owned_directly && !owned_via_nat {
            errors.referential(
                field,
                format!("The specified IP address ({}) is not assigned to this device.", ip.address),
            );
        }
    }
    Ok(())
}

/// Defaults taken from the device type when a device is created
pub fn apply_creation_defaults(device: &mut Device, device_type: &DeviceType) {
    if device.airflow.is_none() {
        device.airflow = device_type.airflow;
    }
    if device.platform_id.is_none() {
        device.platform_id = device_type.default_platform_id;
    }
}

/// A racked device always takes the rack's location
pub fn apply_rack_location(device: &mut Device, rack: Option<&Rack>) {
    if let Some(location_id) = rack.and_then(|r| r.location_id) {
        device.location_id = Some(location_id);
    }
}

/// The primary address, preferring IPv4 when configured
pub fn primary_ip(device: &Device, settings: &Settings) -> Option<u64> {
    if settings.prefer_ipv4 && device.primary_ip4_id.is_some() {
        device.primary_ip4_id
    } else {
        device.primary_ip6_id.or(device.primary_ip4_id)
    }
}
