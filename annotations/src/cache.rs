//! Lookups of already materialized cluster state needed by the builders.

use crate::errors::LookupError;
use std::collections::{BTreeMap, HashMap};

pub type Labels = BTreeMap<String, String>;

pub trait SecretStore {
    /// Content of `key` in secret `secret`, given as "namespace/name".
    fn secret_content(&self, secret: &str, key: &str) -> Result<&[u8], LookupError>;
}

pub trait PodStore {
    /// Labels of the pod an endpoint target reference points to.
    fn pod_labels(&self, target_ref: &str) -> Result<&Labels, LookupError>;
}

/// In-memory secrets and pods, loaded from a snapshot or built by tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    secrets: HashMap<String, HashMap<String, Vec<u8>>>,
    pods: HashMap<String, Labels>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_secret<S, K, V>(&mut self, secret: S, key: K, content: V)
    where
        S: Into<String>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        self.secrets
            .entry(secret.into())
            .or_default()
            .insert(key.into(), content.into());
    }

    pub fn add_pod<R: Into<String>>(&mut self, target_ref: R, labels: Labels) {
        self.pods.insert(target_ref.into(), labels);
    }
}

impl SecretStore for MemoryCache {
    fn secret_content(&self, secret: &str, key: &str) -> Result<&[u8], LookupError> {
        let content = self
            .secrets
            .get(secret)
            .ok_or_else(|| LookupError::SecretNotFound(secret.to_string()))?;
        content
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::MissingKey {
                secret: secret.to_string(),
                key: key.to_string(),
            })
    }
}

impl PodStore for MemoryCache {
    fn pod_labels(&self, target_ref: &str) -> Result<&Labels, LookupError> {
        self.pods
            .get(target_ref)
            .ok_or_else(|| LookupError::PodNotFound(target_ref.to_string()))
    }
}
