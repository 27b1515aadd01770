use super::{BackendData, describe, rejected};
use crate::keys;

const MODSECURITY: &str = "modsecurity";

/// Web application firewall.
pub(super) fn build(data: &mut BackendData) {
    let waf = data.mapper.get_str(keys::WAF);
    if waf.value.is_empty() {
        return;
    }
    if waf.value != MODSECURITY {
        tracing::warn!("ignoring invalid WAF mode on {}: {}", describe(&waf), waf.value);
        rejected("waf");
        return;
    }
    data.backend.waf = MODSECURITY.to_string();
}
