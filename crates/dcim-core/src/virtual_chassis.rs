//! Virtual chassis interface aggregation
//!
//! Members of a virtual chassis share a control plane, so the master's
//! interfaces include every member's non-management interfaces for IP
//! purposes.

use crate::error::{DcimError, ValidationErrors};
use dcim_models::*;
use dcim_store::{ComponentFilter, DcimStore, DeviceFilter, IpAddressFilter};
use std::collections::BTreeMap;
use tracing::debug;

/// Interfaces that count as local to `device`
///
/// Always the device's own interfaces. When the device belongs to a virtual
/// chassis and either is its master or `if_master` is false, every member's
/// non-management interfaces are added. Ordered by id.
pub async fn vc_interfaces(store: &dyn DcimStore, device: &Device, if_master: bool) -> Result<Vec<Component>, DcimError> {
    let mut interfaces: BTreeMap<u64, Component> = BTreeMap::new();
    if let Some(device_id) = device.id {
        for iface in store
            .query_components(&ComponentFilter::of_device(device_id).kind(ComponentKind::Interface))
            .await?
        {
            if let Some(id) = iface.id {
                interfaces.insert(id, iface);
            }
        }
    }

    if let Some(vc_id) = device.virtual_chassis_id {
        let virtual_chassis = store.get_virtual_chassis(vc_id).await?;
        let is_master = device.id.is_some() && virtual_chassis.master_id == device.id;
        if is_master || !if_master {
            for member in store.query_devices(&DeviceFilter::in_virtual_chassis(vc_id)).await? {
                let Some(member_id) = member.id else { continue };
                for iface in store
                    .query_components(&ComponentFilter::of_device(member_id).kind(ComponentKind::Interface))
                    .await?
                {
                    let mgmt_only = iface.as_interface().is_some_and(|data| data.mgmt_only);
                    if let (Some(id), false) = (iface.id, mgmt_only) {
                        interfaces.entry(id).or_insert(iface);
                    }
                }
            }
        }
    }
    Ok(interfaces.into_values().collect())
}

/// Addresses eligible as a primary IP of one family: those assigned to one
/// of the device's [`vc_interfaces`] (as master) and those NAT-mapped onto
/// such an address
pub async fn primary_ip_candidates(store: &dyn DcimStore, device: &Device, family: u8) -> Result<Vec<IpAddress>, DcimError> {
    let interface_ids: Vec<u64> = vc_interfaces(store, device, true)
        .await?
        .into_iter()
        .filter_map(|c| c.id)
        .collect();
    if interface_ids.is_empty() {
        return Ok(Vec::new());
    }
    let direct = store
        .query_ip_addresses(&IpAddressFilter {
            family: Some(family),
            interface_ids: Some(interface_ids),
            nat_inside_ids: None,
        })
        .await?;
    let inside_ids: Vec<u64> = direct.iter().map(|ip| ip.id).collect();
    let mut candidates = direct;
    if !inside_ids.is_empty() {
        let outside = store
            .query_ip_addresses(&IpAddressFilter {
                family: Some(family),
                interface_ids: None,
                nat_inside_ids: Some(inside_ids),
            })
            .await?;
        candidates.extend(outside);
    }
    Ok(candidates)
}

/// The master must be a member, once the chassis exists
pub async fn clean_virtual_chassis(store: &dyn DcimStore, virtual_chassis: &VirtualChassis) -> Result<ValidationErrors, DcimError> {
    let mut errors = ValidationErrors::new();
    if let (Some(vc_id), Some(master_id)) = (virtual_chassis.id, virtual_chassis.master_id) {
        let master = store.get_device(master_id).await?;
        if master.virtual_chassis_id != Some(vc_id) {
            errors.referential(
                "master",
                format!(
                    "The selected master ({}) is not assigned to this virtual chassis.",
                    master.identifier()
                ),
            );
        }
    }
    Ok(errors)
}

/// Refuse deletion while a member interface has its LAG on another member
pub async fn check_virtual_chassis_delete(store: &dyn DcimStore, virtual_chassis: &VirtualChassis) -> Result<(), DcimError> {
    let Some(vc_id) = virtual_chassis.id else {
        return Ok(());
    };
    let mut cross_chassis = Vec::new();
    for member in store.query_devices(&DeviceFilter::in_virtual_chassis(vc_id)).await? {
        let Some(member_id) = member.id else { continue };
        for iface in store
            .query_components(&ComponentFilter::of_device(member_id).kind(ComponentKind::Interface))
            .await?
        {
            let Some(lag_id) = iface.as_interface().and_then(|data| data.lag_id) else {
                continue;
            };
            let lag = store.get_component(lag_id).await?;
            if lag.device_id != iface.device_id
                && let Some(id) = iface.id
            {
                cross_chassis.push(id);
            }
        }
    }
    if cross_chassis.is_empty() {
        return Ok(());
    }
    debug!("Virtual chassis {} has {} cross-chassis LAG members", virtual_chassis.name, cross_chassis.len());
    Err(DcimError::StructuralInvariantViolation {
        message: format!(
            "Unable to delete virtual chassis {}. There are member interfaces which form a cross-chassis LAG",
            virtual_chassis.name
        ),
        objects: cross_chassis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    async fn stack(fx: &Fixture) -> (Device, Device, VirtualChassis) {
        let dt = fx.device_type("EX4300", Units::ONE, true);
        let master = fx.device(&dt);
        let member = fx.device(&dt);
        let vc = fx.virtual_chassis("stack1", None);
        let master = fx.join_chassis(&master, &vc, 1).await;
        let member = fx.join_chassis(&member, &vc, 2).await;
        let mut vc = vc;
        vc.master_id = master.id;
        let vc = fx.store.update_virtual_chassis(&vc).await.unwrap();
        (master, member, vc)
    }

    #[tokio::test]
    async fn test_master_sees_member_data_interfaces() {
        let fx = Fixture::new();
        let (master, member, _) = stack(&fx).await;
        let own = fx.interface(&master, "ge-0/0/0");
        let peer = fx.interface(&member, "ge-1/0/0");
        let mut mgmt = fx.interface(&member, "em0");
        if let Some(data) = mgmt.as_interface_mut() {
            data.mgmt_only = true;
        }
        fx.store.update_component(&mgmt).await.unwrap();

        let ids: Vec<u64> = vc_interfaces(&fx.store, &master, true)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![own.id.unwrap(), peer.id.unwrap()]);

        // A non-master only sees its own unless if_master is off
        let member_only = vc_interfaces(&fx.store, &member, true).await.unwrap();
        assert_eq!(member_only.len(), 2, "own data and management interfaces");
        let widened = vc_interfaces(&fx.store, &member, false).await.unwrap();
        assert_eq!(widened.len(), 3);
    }

    #[tokio::test]
    async fn test_primary_ip_candidates_include_nat_outside() {
        let fx = Fixture::new();
        let (master, member, _) = stack(&fx).await;
        let peer = fx.interface(&member, "ge-1/0/0");
        let inside = fx.ip("10.0.0.1/24", Some(AssignedObject::Interface(peer.id.unwrap())), None);
        let outside = fx.ip("203.0.113.1/32", None, Some(inside.id));
        fx.ip("2001:db8::1/64", Some(AssignedObject::Interface(peer.id.unwrap())), None);

        let ids: Vec<u64> = primary_ip_candidates(&fx.store, &master, 4)
            .await
            .unwrap()
            .into_iter()
            .map(|ip| ip.id)
            .collect();
        assert_eq!(ids, vec![inside.id, outside.id]);
    }

    #[tokio::test]
    async fn test_master_must_be_member() {
        let fx = Fixture::new();
        let (_, _, mut vc) = stack(&fx).await;
        let dt = fx.device_type("outsider", Units::ONE, true);
        let outsider = fx.device(&dt);
        vc.master_id = outsider.id;
        let errors = clean_virtual_chassis(&fx.store, &vc).await.unwrap();
        assert_eq!(
            errors.messages("master"),
            vec![format!("The selected master ({}) is not assigned to this virtual chassis.", outsider.identifier())]
        );

        // Not checked before the chassis has an id
        vc.id = None;
        assert!(clean_virtual_chassis(&fx.store, &vc).await.unwrap().is_empty());
    }
}
