use super::BackendData;
use crate::config::parse_bool;
use crate::keys;
use crate::types::Hsts;
use std::collections::BTreeMap;

/// HTTP Strict Transport Security, resolved per path.
pub(super) fn build(data: &mut BackendData) {
    data.backend.hsts = data
        .mapper
        .get_backend_config_with(&data.backend, keys::HSTS_KEYS, hsts_config);
}

fn hsts_config(values: &BTreeMap<String, String>) -> Hsts {
    let value = |key: &str| values.get(key).map(String::as_str).unwrap_or("");
    let flag = |key: &str| parse_bool(value(key)).unwrap_or(false);
    Hsts {
        enabled: flag(keys::HSTS),
        max_age: value(keys::HSTS_MAX_AGE).parse().unwrap_or(0),
        subdomains: flag(keys::HSTS_INCLUDE_SUBDOMAINS),
        preload: flag(keys::HSTS_PRELOAD),
    }
}
