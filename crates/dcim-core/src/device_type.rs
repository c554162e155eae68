//! Device type validation
//!
//! A device type's height and depth are shared by every device of the type,
//! so changing them is checked against each racked instance.

use crate::error::{DcimError, ErrorCategory, ValidationErrors};
use crate::placement::{rack_unit_space, required_face};
use dcim_models::*;
use dcim_store::{DcimStore, DeviceFilter};
use tracing::debug;

/// Validate `updated` against its stored version (`original`, `None` for a
/// new type) and the devices placed with it
pub async fn clean_device_type(
    store: &dyn DcimStore,
    original: Option<&DeviceType>,
    updated: &DeviceType,
) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();

    if !updated.u_height.is_half_aligned() {
        errors.placement("u_height", "U height must be in increments of 0.5 rack units.");
    }

    if let (Some(original), Some(type_id), true) = (original, updated.id, updated.u_height.is_half_aligned()) {
        let height_changed = updated.u_height != original.u_height;
        let became_full_depth = updated.is_full_depth && !original.is_full_depth;
        let racked = store.query_devices(&DeviceFilter::of_type(type_id).positioned()).await?;

        if updated.u_height.is_zero() && !original.u_height.is_zero() {
            if !racked.is_empty() {
                errors.add_with_objects(
                    "u_height",
                    ErrorCategory::Structural,
                    format!(
                        "Unable to set 0U height: Found {} instances already mounted within racks.",
                        racked.len()
                    ),
                    racked.iter().filter_map(|d| d.id).collect(),
                );
            }
        } else if !updated.u_height.is_zero() && (height_changed || became_full_depth) {
            check_instances_fit(store, updated, &racked, &mut errors).await?;
        }
    }

    if let Some(type_id) = updated.id
        && !updated.is_parent_device()
    {
        let bays = store
            .query_templates(TemplateOwner::DeviceType(type_id), Some(ComponentKind::DeviceBay))
            .await?;
        if !bays.is_empty() {
            errors.add(
                "subdevice_role",
                ErrorCategory::Structural,
                "Must delete all device bay templates associated with this device before declassifying it as a parent device.",
            );
        }
    }

    if updated.is_child_device() && !updated.u_height.is_zero() {
        errors.placement("u_height", "Child device types must be 0U.");
    }

    Ok(errors)
}

/// Re-run the rack space check for each placed instance at the new height.
/// The first instance that no longer fits is reported with its blockers.
async fn check_instances_fit(
    store: &dyn DcimStore,
    updated: &DeviceType,
    racked: &[Device],
    errors: &mut ValidationErrors,
) -> Result<(), DcimError> {
    for device in racked {
        let (Some(device_id), Some(rack_id), Some(position)) = (device.id, device.rack_id, device.position) else {
            continue;
        };
        let rack = store.get_rack(rack_id).await?;
        let space = rack_unit_space(store, &rack, &[device_id]).await?;
        let face = required_face(device.face, updated);
        if space.fits(position, updated.u_height, face) {
            continue;
        }
        let mut objects = vec![device_id];
        objects.extend(space.blockers(position, updated.u_height, face));
        debug!("Device {} blocks resize of {}", device.identifier(), updated.model);
        errors.add_with_objects(
            "u_height",
            ErrorCategory::Structural,
            format!(
                "Device {} in rack {} does not have sufficient space to accommodate a height of {}U",
                device.identifier(),
                rack.name,
                updated.u_height
            ),
            objects,
        );
        break;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[tokio::test]
    async fn test_misaligned_and_child_height() {
        let fx = Fixture::new();
        let mut dt = fx.device_type("blade", Units::from_tenths(13), false);
        dt.subdevice_role = Some(SubdeviceRole::Child);
        let errors = clean_device_type(&fx.store, None, &dt).await.unwrap();
        assert_eq!(
            errors.messages("u_height"),
            vec!["U height must be in increments of 0.5 rack units.", "Child device types must be 0U."]
        );
    }

    #[tokio::test]
    async fn test_zero_height_refused_while_racked() {
        let fx = Fixture::new();
        let rack = fx.rack(42);
        let dt = fx.device_type("sw", Units::ONE, true);
        let device = fx.racked_device(&dt, &rack, 5, RackFace::Front);
        let mut flat = dt.clone();
        flat.u_height = Units::ZERO;

        let errors = clean_device_type(&fx.store, Some(&dt), &flat).await.unwrap();
        assert_eq!(
            errors.messages("u_height"),
            vec!["Unable to set 0U height: Found 1 instances already mounted within racks."]
        );
        assert_eq!(errors.get("u_height")[0].objects, vec![device.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_declassifying_parent_with_bay_templates() {
        let fx = Fixture::new();
        let mut chassis = fx.device_type("chassis", Units::whole(10), true);
        chassis.subdevice_role = Some(SubdeviceRole::Parent);
        let chassis = fx.add_device_type(chassis);
        fx.template(TemplateOwner::DeviceType(chassis.id.unwrap()), "Bay [1-4]", TemplateKind::DeviceBay);

        let mut plain = chassis.clone();
        plain.subdevice_role = None;
        let errors = clean_device_type(&fx.store, Some(&chassis), &plain).await.unwrap();
        assert!(errors.contains("subdevice_role"));
        assert!(matches!(errors.into_result(), Err(DcimError::StructuralInvariantViolation { .. })));
    }

    #[tokio::test]
    async fn test_becoming_full_depth_checks_rear_face() {
        let fx = Fixture::new();
        let rack = fx.rack(10);
        let half = fx.device_type("half", Units::ONE, false);
        let front = fx.racked_device(&half, &rack, 3, RackFace::Front);
        let other = fx.device_type("other", Units::ONE, false);
        let rear = fx.racked_device(&other, &rack, 3, RackFace::Rear);

        let mut deep = half.clone();
        deep.is_full_depth = true;
        let errors = clean_device_type(&fx.store, Some(&half), &deep).await.unwrap();
        assert_eq!(errors.get("u_height")[0].objects, vec![front.id.unwrap(), rear.id.unwrap()]);
    }
}
