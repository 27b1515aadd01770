//! Backend annotation keys, without the controller prefix.

use std::collections::BTreeMap;

pub const AFFINITY: &str = "affinity";
pub const SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const SESSION_COOKIE_STRATEGY: &str = "session-cookie-strategy";
pub const SESSION_COOKIE_DYNAMIC: &str = "session-cookie-dynamic";

pub const AUTH_TYPE: &str = "auth-type";
pub const AUTH_SECRET: &str = "auth-secret";
pub const AUTH_REALM: &str = "auth-realm";

pub const BLUE_GREEN_BALANCE: &str = "blue-green-balance";
pub const BLUE_GREEN_MODE: &str = "blue-green-mode";

pub const HSTS: &str = "hsts";
pub const HSTS_MAX_AGE: &str = "hsts-max-age";
pub const HSTS_INCLUDE_SUBDOMAINS: &str = "hsts-include-subdomains";
pub const HSTS_PRELOAD: &str = "hsts-preload";

pub const OAUTH: &str = "oauth";
pub const OAUTH_URI_PREFIX: &str = "oauth-uri-prefix";
pub const OAUTH_HEADERS: &str = "oauth-headers";

pub const REWRITE_TARGET: &str = "rewrite-target";

pub const WAF: &str = "waf";

pub const WHITELIST_SOURCE_RANGE: &str = "whitelist-source-range";

/// Keys resolved per path by the HSTS builder.
pub const HSTS_KEYS: &[&str] = &[HSTS, HSTS_MAX_AGE, HSTS_INCLUDE_SUBDOMAINS, HSTS_PRELOAD];

/// Keeps the annotations carrying `prefix` and strips it from their keys.
///
/// A prefix without the trailing slash is accepted, so both
/// `ingress.kubernetes.io` and `ingress.kubernetes.io/` select
/// `ingress.kubernetes.io/hsts`.
pub fn strip_prefix<'a, I>(prefix: &str, raw: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let prefix = prefix.trim_end_matches('/');
    raw.into_iter()
        .filter_map(|(key, value)| {
            let key = if prefix.is_empty() {
                key.as_str()
            } else {
                key.strip_prefix(prefix)?.strip_prefix('/')?
            };
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.clone()))
        })
        .collect()
}
