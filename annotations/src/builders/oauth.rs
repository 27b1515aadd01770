use super::{BackendData, describe, rejected};
use crate::keys;
use crate::registry::Registry;
use crate::types::OAuthConfig;
use http::HeaderName;
use std::collections::BTreeMap;

const OAUTH2_PROXY: &str = "oauth2_proxy";
const DEFAULT_URI_PREFIX: &str = "/oauth2";
const DEFAULT_HEADERS: &str = "X-Auth-Request-Email:auth_response_email";

/// External OAuth authentication through an oauth2_proxy backend.
pub(super) fn build(data: &mut BackendData, registry: &Registry) {
    let oauth = data.mapper.get_str(keys::OAUTH);
    if oauth.value.is_empty() {
        return;
    }
    let source = describe(&oauth);
    if oauth.value != OAUTH2_PROXY {
        tracing::warn!("ignoring invalid oauth implementation '{}' on {source}", oauth.value);
        rejected("oauth");
        return;
    }

    let uri_prefix = match data.mapper.get_str_value(keys::OAUTH_URI_PREFIX) {
        "" => DEFAULT_URI_PREFIX,
        prefix => prefix,
    };
    let namespace = oauth
        .source
        .map_or(data.backend.id.namespace.as_str(), |source| source.namespace.as_str());
    let Some(auth_backend) = registry.find_backend_path(namespace, uri_prefix) else {
        tracing::error!("path '{uri_prefix}' was not found on namespace '{namespace}'");
        rejected("oauth");
        return;
    };

    let headers = data.mapper.get_str(keys::OAUTH_HEADERS);
    let headers = if headers.found() || !headers.value.is_empty() {
        headers.value
    } else {
        DEFAULT_HEADERS
    };

    let config = OAuthConfig {
        implementation: OAUTH2_PROXY.to_string(),
        backend_name: auth_backend.to_string(),
        uri_prefix: uri_prefix.to_string(),
        headers: parse_headers(headers, &source),
    };
    data.backend.oauth = Some(config);
}

/// Parses a comma separated list of `Header-Name:attribute` pairs.
fn parse_headers(headers: &str, source: &str) -> BTreeMap<String, String> {
    let mut parsed = BTreeMap::new();
    for entry in headers.split(',').filter(|entry| !entry.is_empty()) {
        let fields: Vec<&str> = entry.split(':').collect();
        match fields.as_slice() {
            [name, attribute] if HeaderName::from_bytes(name.as_bytes()).is_ok() => {
                parsed.insert(name.to_string(), attribute.to_string());
            }
            _ => tracing::warn!("invalid header format '{entry}' on {source}"),
        }
    }
    parsed
}
