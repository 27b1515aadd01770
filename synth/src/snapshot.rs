//! Cluster state read from a YAML snapshot, and the rendering of every
//! backend it declares.

use annotations::keys::strip_prefix;
use annotations::types::Endpoint;
use annotations::{
    AnnotationConfig, Backend, BackendData, BackendId, Labels, MapBuilder, MemoryCache, Registry,
    Source, Updater, Userlist,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Snapshot {
    pub resources: Vec<Resource>,
    pub backends: Vec<BackendSnapshot>,
    /// Pod labels, by the target reference of the endpoints
    pub pods: BTreeMap<String, Labels>,
    /// Secret content by "namespace/name", then by key
    pub secrets: BTreeMap<String, BTreeMap<String, String>>,
}

/// A resource declaring annotations and routing paths to backends.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Resource {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_kind() -> String {
    "ingress".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Rule {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    pub service: String,
    pub port: String,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendSnapshot {
    pub namespace: String,
    pub name: String,
    pub port: String,
    #[serde(default)]
    pub tcp: bool,
    #[serde(default)]
    pub endpoints: Vec<EndpointSnapshot>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EndpointSnapshot {
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub target_ref: Option<String>,
}

fn default_weight() -> u32 {
    1
}

/// Resolved configuration of every backend of a snapshot.
#[derive(Debug, Serialize)]
pub struct Rendered {
    pub backends: Vec<Backend>,
    pub userlists: Vec<Userlist>,
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("could not load snapshot from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse snapshot: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("backend '{0}' is declared more than once")]
    DuplicateBackend(String),
    #[error("{resource} routes to unknown backend '{backend}'")]
    UnknownBackend { resource: String, backend: String },
}

impl Snapshot {
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    fn cache(&self) -> MemoryCache {
        let mut cache = MemoryCache::new();
        for (target_ref, labels) in &self.pods {
            cache.add_pod(target_ref.as_str(), labels.clone());
        }
        for (secret, content) in &self.secrets {
            for (key, value) in content {
                cache.add_secret(secret.as_str(), key.as_str(), value.as_str());
            }
        }
        cache
    }

    /// Runs every builder on every backend, in declaration order.
    pub fn render(&self, config: AnnotationConfig) -> Result<Rendered, SnapshotError> {
        let prefix = config.prefix.clone();
        let map_builder = MapBuilder::new(config);

        let mut backends: IndexMap<BackendId, BackendData> = IndexMap::new();
        for snapshot in &self.backends {
            let mut backend = Backend::new(&snapshot.namespace, &snapshot.name, &snapshot.port);
            backend.mode_tcp = snapshot.tcp;
            backend.endpoints = snapshot
                .endpoints
                .iter()
                .map(|endpoint| Endpoint {
                    ip: endpoint.ip.clone(),
                    port: endpoint.port,
                    weight: endpoint.weight,
                    target_ref: endpoint.target_ref.clone(),
                })
                .collect();
            let id = backend.id.clone();
            let data = BackendData::new(backend, map_builder.new_mapper());
            if backends.insert(id.clone(), data).is_some() {
                return Err(SnapshotError::DuplicateBackend(id.to_string()));
            }
        }

        let mut registry = Registry::new();
        for resource in &self.resources {
            let source = Source::new(&resource.kind, &resource.namespace, &resource.name);
            let annotations = strip_prefix(&prefix, &resource.annotations);
            for rule in &resource.rules {
                let id = BackendId {
                    namespace: resource.namespace.clone(),
                    name: rule.service.clone(),
                    port: rule.port.clone(),
                };
                let Some(data) = backends.get_mut(&id) else {
                    return Err(SnapshotError::UnknownBackend {
                        resource: source.to_string(),
                        backend: id.to_string(),
                    });
                };
                registry.acquire_host(&rule.host).add_path(&id, &rule.path);
                data.backend.add_host_path(&rule.host, &rule.path);
                let scope = format!("{}{}", rule.host, rule.path);
                data.mapper.add_annotations(&source, &scope, &annotations);
            }
        }

        let cache = self.cache();
        let mut updater = Updater::new(&cache, &cache, &registry);
        let mut rendered = Vec::with_capacity(backends.len());
        for (id, mut data) in backends {
            tracing::debug!(backend = %id, paths = data.backend.paths.len(), "updating backend");
            updater.update_backend_config(&mut data);
            rendered.push(data.backend);
        }

        Ok(Rendered {
            backends: rendered,
            userlists: updater.into_userlists(),
        })
    }
}
