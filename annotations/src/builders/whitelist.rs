use super::{BackendData, describe};
use crate::keys;
use std::net::IpAddr;

/// Source address whitelist of HTTP backends, resolved per path.
pub(super) fn build_http(data: &mut BackendData) {
    if data.backend.mode_tcp {
        return;
    }
    data.backend.whitelist_http = data.mapper.get_backend_config_with(
        &data.backend,
        &[keys::WHITELIST_SOURCE_RANGE],
        |values| {
            values
                .get(keys::WHITELIST_SOURCE_RANGE)
                .map(|ranges| split_ranges(ranges).map(String::from).collect::<Vec<_>>())
                .unwrap_or_default()
        },
    );
}

/// Source address whitelist of TCP backends. Invalid CIDRs are skipped.
pub(super) fn build_tcp(data: &mut BackendData) {
    if !data.backend.mode_tcp {
        return;
    }
    let ranges = data.mapper.get_str(keys::WHITELIST_SOURCE_RANGE);
    let mut whitelist = Vec::new();
    for cidr in split_ranges(ranges.value) {
        if is_valid_cidr(cidr) {
            whitelist.push(cidr.to_string());
        } else {
            tracing::warn!(
                "skipping invalid cidr '{cidr}' in whitelist config on {}",
                describe(&ranges)
            );
        }
    }
    data.backend.whitelist_tcp = whitelist;
}

fn split_ranges(ranges: &str) -> impl Iterator<Item = &str> {
    ranges
        .split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
}

/// Accepts `address/prefix` with a prefix length fitting the address family.
fn is_valid_cidr(cidr: &str) -> bool {
    let Some((address, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(address) = address.parse::<IpAddr>() else {
        return false;
    };
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let max = if address.is_ipv4() { 32 } else { 128 };
    prefix.parse::<u8>().is_ok_and(|prefix| prefix <= max)
}
