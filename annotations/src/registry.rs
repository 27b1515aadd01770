//! Host and path registry of the proxy configuration being built.

use crate::types::BackendId;
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
pub struct HostPath {
    pub path: String,
    pub backend: BackendId,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Host {
    paths: Vec<HostPath>,
}

impl Host {
    /// Links `path` of this host to `backend`. The first link of a path wins.
    pub fn add_path(&mut self, backend: &BackendId, path: &str) {
        if self.paths.iter().any(|hostpath| hostpath.path == path) {
            return;
        }
        self.paths.push(HostPath {
            path: path.to_string(),
            backend: backend.clone(),
        });
    }

    pub fn paths(&self) -> &[HostPath] {
        &self.paths
    }
}

/// Every host known to the configuration, in acquisition order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    hosts: IndexMap<String, Host>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_host(&mut self, hostname: &str) -> &mut Host {
        self.hosts.entry(hostname.to_string()).or_default()
    }

    pub fn host(&self, hostname: &str) -> Option<&Host> {
        self.hosts.get(hostname)
    }

    /// Finds the backend of `namespace` serving exactly `path` on any host.
    pub fn find_backend_path(&self, namespace: &str, path: &str) -> Option<&BackendId> {
        self.hosts
            .values()
            .flat_map(|host| host.paths.iter())
            .find(|hostpath| hostpath.path == path && hostpath.backend.namespace == namespace)
            .map(|hostpath| &hostpath.backend)
    }
}
