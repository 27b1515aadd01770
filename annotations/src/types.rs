use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One host/path pair routed to a backend.
///
/// `hostpath` is the scope annotations are declared at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackendPath {
    pub id: String,
    pub hostpath: String,
    pub path: String,
}

/// Paths of a backend, kept sorted by hostpath and free of duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackendPaths {
    items: Vec<BackendPath>,
}

impl BackendPaths {
    pub fn new<I: IntoIterator<Item = BackendPath>>(paths: I) -> Self {
        let mut backend_paths = BackendPaths::default();
        for path in paths {
            backend_paths.add(path);
        }
        backend_paths
    }

    /// Adds a path, ignoring it if its hostpath is already present.
    pub fn add(&mut self, path: BackendPath) {
        if let Err(pos) = self
            .items
            .binary_search_by(|item| item.hostpath.cmp(&path.hostpath))
        {
            self.items.insert(pos, path);
        }
    }

    pub fn find(&self, hostpath: &str) -> Option<&BackendPath> {
        self.items
            .binary_search_by(|item| item.hostpath.as_str().cmp(hostpath))
            .ok()
            .map(|pos| &self.items[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendPath> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn hostpaths(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.hostpath.as_str()).collect()
    }
}

/// A configuration value shared by a group of paths of the same backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackendConfig<T> {
    pub paths: BackendPaths,
    pub config: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BackendId {
    pub namespace: String,
    pub name: String,
    pub port: String,
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.namespace, self.name, self.port)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub ip: String,
    pub port: u16,
    /// Relative weight, 0 disables the endpoint
    pub weight: u32,
    /// Pod name backing this endpoint, if any
    pub target_ref: Option<String>,
}

impl Endpoint {
    pub fn new<I: Into<String>>(ip: I, port: u16, target_ref: Option<String>) -> Self {
        Endpoint {
            ip: ip.into(),
            port,
            weight: 1,
            target_ref,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieStrategy {
    #[default]
    Insert,
    Rewrite,
    Prefix,
}

impl CookieStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insert" => Some(CookieStrategy::Insert),
            "rewrite" => Some(CookieStrategy::Rewrite),
            "prefix" => Some(CookieStrategy::Prefix),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cookie {
    pub name: String,
    pub strategy: CookieStrategy,
    pub dynamic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthHttp {
    /// Name of the userlist holding the credentials
    pub userlist: String,
    pub realm: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub name: String,
    pub passwd: String,
    pub encrypted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Userlist {
    pub name: String,
    pub users: Vec<User>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Hsts {
    pub enabled: bool,
    pub max_age: i64,
    pub subdomains: bool,
    pub preload: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OAuthConfig {
    pub implementation: String,
    pub backend_name: String,
    pub uri_prefix: String,
    pub headers: BTreeMap<String, String>,
}

/// A backend and the configuration synthesized from its annotations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Backend {
    pub id: BackendId,
    pub paths: BackendPaths,
    pub endpoints: Vec<Endpoint>,
    pub mode_tcp: bool,

    pub cookie: Option<Cookie>,
    pub auth_http: Option<AuthHttp>,
    pub hsts: Vec<BackendConfig<Hsts>>,
    pub oauth: Option<OAuthConfig>,
    pub rewrite_url: Vec<BackendConfig<String>>,
    pub waf: String,
    pub whitelist_http: Vec<BackendConfig<Vec<String>>>,
    pub whitelist_tcp: Vec<String>,
}

impl Backend {
    pub fn new<N, M, P>(namespace: N, name: M, port: P) -> Self
    where
        N: Into<String>,
        M: Into<String>,
        P: Into<String>,
    {
        Backend {
            id: BackendId {
                namespace: namespace.into(),
                name: name.into(),
                port: port.into(),
            },
            paths: BackendPaths::default(),
            endpoints: Vec::new(),
            mode_tcp: false,
            cookie: None,
            auth_http: None,
            hsts: Vec::new(),
            oauth: None,
            rewrite_url: Vec::new(),
            waf: String::new(),
            whitelist_http: Vec::new(),
            whitelist_tcp: Vec::new(),
        }
    }

    /// Registers `host` + `path` as a path of this backend.
    pub fn add_host_path(&mut self, host: &str, path: &str) {
        let hostpath = format!("{host}{path}");
        if self.paths.find(&hostpath).is_some() {
            return;
        }
        let id = format!("path{:02}", self.paths.len() + 1);
        self.paths.add(BackendPath {
            id,
            hostpath,
            path: path.to_string(),
        });
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id.namespace, self.id.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_sorted_and_unique() {
        let mut backend = Backend::new("default", "app", "8080");
        backend.add_host_path("", "/url");
        backend.add_host_path("", "/");
        backend.add_host_path("", "/path");
        backend.add_host_path("", "/url");

        assert_eq!(backend.paths.hostpaths(), vec!["/", "/path", "/url"]);
        assert_eq!(backend.paths.find("/url").map(|p| p.id.as_str()), Some("path01"));
        assert_eq!(backend.paths.find("/path").map(|p| p.id.as_str()), Some("path03"));
        assert!(backend.paths.find("/other").is_none());
    }

    #[test]
    fn test_names() {
        let backend = Backend::new("default", "app", "8080");
        assert_eq!(backend.id.to_string(), "default_app_8080");
        assert_eq!(backend.to_string(), "default/app");

        let endpoint = Endpoint::new("172.17.0.11", 8080, None);
        assert_eq!(endpoint.address(), "172.17.0.11:8080");
        assert_eq!(endpoint.weight, 1);
    }
}
