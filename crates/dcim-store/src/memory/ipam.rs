//! IP addresses of the in-memory store

use super::MemoryState;
use crate::query::IpAddressFilter;
use dcim_models::IpAddress;

pub(super) fn query_ip_addresses(state: &MemoryState, filter: &IpAddressFilter) -> Vec<IpAddress> {
    state
        .ip_addresses
        .values()
        .filter(|ip| filter.matches(ip))
        .cloned()
        .collect()
}
