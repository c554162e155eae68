//! Rack placement queries
//!
//! Builds a [`RackUnitSpace`] from the devices the store holds for a rack and
//! answers placement questions against it.

use crate::error::DcimError;
use crate::rack_units::RackUnitSpace;
use dcim_models::{DeviceType, Rack, RackFace, Units};
use dcim_store::{DcimStore, DeviceFilter};
use std::collections::HashMap;
use tracing::debug;

/// Face to check for a device: `None` (both faces) when it is full depth
pub fn required_face(face: Option<RackFace>, device_type: &DeviceType) -> Option<RackFace> {
    if device_type.is_full_depth { None } else { face }
}

/// Occupancy of `rack` from every positioned device except those in `exclude`
pub async fn rack_unit_space(
    store: &dyn DcimStore,
    rack: &Rack,
    exclude: &[u64],
) -> Result<RackUnitSpace, DcimError> {
    let devices = store
        .query_devices(&DeviceFilter::in_rack(rack.id).positioned().excluding(exclude))
        .await?;

    let mut device_types: HashMap<u64, DeviceType> = HashMap::new();
    let mut space = RackUnitSpace::new(rack);
    for device in &devices {
        let (Some(id), Some(position)) = (device.id, device.position) else {
            continue;
        };
        if !device_types.contains_key(&device.device_type_id) {
            let device_type = store.get_device_type(device.device_type_id).await?;
            device_types.insert(device.device_type_id, device_type);
        }
        if let Some(device_type) = device_types.get(&device.device_type_id) {
            space.occupy(id, position, device_type.u_height, device.face, device_type.is_full_depth);
        }
    }
    debug!("Rack {} holds {} positioned devices", rack.name, devices.len());
    Ok(space)
}

/// Same as [`rack_unit_space`], with the rack's reservations marked
pub async fn rack_unit_space_with_reservations(
    store: &dyn DcimStore,
    rack: &Rack,
) -> Result<RackUnitSpace, DcimError> {
    let mut space = rack_unit_space(store, rack, &[]).await?;
    for reservation in store.query_rack_reservations(rack.id).await? {
        for unit in reservation.units {
            space.reserve(unit);
        }
    }
    Ok(space)
}

/// Start positions where a device of `u_height` fits
///
/// `face == None` requires both faces free (full-depth placement). Devices
/// listed in `exclude` are ignored, which lets a device be moved within the
/// rack it already occupies.
pub async fn available_units(
    store: &dyn DcimStore,
    rack: &Rack,
    u_height: Units,
    face: Option<RackFace>,
    exclude: &[u64],
) -> Result<Vec<Units>, DcimError> {
    let space = rack_unit_space(store, rack, exclude).await?;
    Ok(space.available_units(u_height, face))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[tokio::test]
    async fn test_available_units_exclude_lets_device_move() {
        let fx = Fixture::new();
        let rack = fx.rack(42);
        let full = fx.device_type("2U", Units::whole(2), true);
        let placed = fx.racked_device(&full, &rack, 40, RackFace::Front);

        let units = available_units(&fx.store, &rack, Units::whole(2), None, &[]).await.unwrap();
        assert!(!units.contains(&Units::whole(40)));
        assert!(!units.contains(&Units::whole(39)));

        let excluded = placed.id.into_iter().collect::<Vec<_>>();
        let units = available_units(&fx.store, &rack, Units::whole(2), None, &excluded).await.unwrap();
        assert!(units.contains(&Units::whole(40)));
        assert!(units.contains(&Units::whole(41)));
    }

    #[tokio::test]
    async fn test_reservations_only_affect_utilization() {
        let fx = Fixture::new();
        let rack = fx.rack(10);
        fx.reservation(&rack, &[1, 2]);
        let space = rack_unit_space_with_reservations(&fx.store, &rack).await.unwrap();
        assert!((space.utilization() - 20.0).abs() < 1e-9);
        assert!(space.fits(Units::whole(1), Units::ONE, None));
    }

    #[test]
    fn test_required_face() {
        let fx = Fixture::new();
        let full = fx.device_type("full", Units::ONE, true);
        let half = fx.device_type("half", Units::ONE, false);
        assert_eq!(required_face(Some(RackFace::Rear), &full), None);
        assert_eq!(required_face(Some(RackFace::Rear), &half), Some(RackFace::Rear));
    }
}
