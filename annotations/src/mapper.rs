//! Merges the annotations every resource declares for one backend.
//!
//! Each resource adds its annotations at the scope (hostpath) it routes to the
//! backend. The first declaration of a key is the canonical one; any later
//! declaration with another value is a conflict, kept in the store and
//! reported when the key is read.

use crate::config::{AnnotationConfig, parse_bool};
use crate::grouping::group_paths;
use crate::metrics_defs::{ANNOTATION_CONFLICT, ANNOTATION_INVALID_VALUE, counter};
use crate::source::Source;
use crate::types::{Backend, BackendConfig, BackendPath};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One declaration of an annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Map {
    pub source: Source,
    pub scope: String,
    pub value: String,
}

/// Creates the mappers of a pass, all sharing the same configuration.
#[derive(Clone, Debug)]
pub struct MapBuilder {
    config: Arc<AnnotationConfig>,
}

impl MapBuilder {
    pub fn new(config: AnnotationConfig) -> Self {
        MapBuilder {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn new_mapper(&self) -> Mapper {
        Mapper {
            config: self.config.clone(),
            maps: IndexMap::new(),
        }
    }
}

/// Value of an annotation as seen by the builders.
///
/// `source` is set only when some resource declared the annotation; values
/// coming from the defaults have none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Value<'a> {
    pub value: &'a str,
    pub source: Option<&'a Source>,
}

impl Value<'_> {
    pub fn found(&self) -> bool {
        self.source.is_some()
    }

    /// Boolean view of the value, unparsable values read as false.
    pub fn as_bool(&self) -> bool {
        parse_bool(self.value).unwrap_or(false)
    }

    /// Integer view of the value, unparsable values read as 0.
    pub fn as_int(&self) -> i64 {
        self.value.parse().unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub struct Mapper {
    config: Arc<AnnotationConfig>,
    maps: IndexMap<String, Vec<Map>>,
}

impl Mapper {
    /// Declares `key` with `value` at `scope`.
    ///
    /// Returns false, keeping the stored value, if `key` was already declared
    /// at the same scope.
    pub fn add_annotation(&mut self, source: &Source, scope: &str, key: &str, value: &str) -> bool {
        let maps = self.maps.entry(key.to_string()).or_default();
        if maps.iter().any(|map| map.scope == scope) {
            return false;
        }
        maps.push(Map {
            source: source.clone(),
            scope: scope.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Declares every annotation of a resource at `scope`.
    pub fn add_annotations<'a, I>(&mut self, source: &Source, scope: &str, annotations: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in annotations {
            self.add_annotation(source, scope, key, value);
        }
    }

    /// Canonical value of `key`, falling back to its default.
    ///
    /// Logs a warning if other resources declared `key` with distinct values.
    pub fn get_str(&self, key: &str) -> Value<'_> {
        let Some(canonical) = self.maps.get(key).and_then(|maps| maps.first()) else {
            return Value {
                value: self.config.default_value(key),
                source: None,
            };
        };

        let conflicts = self.conflicting_sources(key);
        if !conflicts.is_empty() {
            let conflicts = conflicts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                "annotation '{}{}' from {} (path '{}') overrides the same annotation with distinct value from [{}]",
                self.config.prefix,
                key,
                canonical.source,
                canonical.scope,
                conflicts
            );
            counter!(ANNOTATION_CONFLICT, "annotation" => key.to_string()).increment(1);
        }

        Value {
            value: &canonical.value,
            source: Some(&canonical.source),
        }
    }

    pub fn get_str_value(&self, key: &str) -> &str {
        self.get_str(key).value
    }

    /// Boolean value of `key`. A declared value rejected by the key's
    /// validator is logged and replaced by the default.
    pub fn get_bool_value(&self, key: &str) -> bool {
        self.get_validated(key).as_bool()
    }

    /// Integer value of `key`, validated like `get_bool_value`.
    pub fn get_int_value(&self, key: &str) -> i64 {
        self.get_validated(key).as_int()
    }

    fn get_validated(&self, key: &str) -> Value<'_> {
        let value = self.get_str(key);
        match value.source {
            Some(source) if !self.is_accepted(key, source, value.value) => Value {
                value: self.config.default_value(key),
                source: None,
            },
            _ => value,
        }
    }

    /// Runs the validator of `key`, if any, over a declared value.
    fn is_accepted(&self, key: &str, source: &Source, value: &str) -> bool {
        let Some(validator) = self.config.validator(key) else {
            return true;
        };
        if validator.is_valid(value) {
            return true;
        }
        tracing::warn!(
            "ignoring invalid {} expression on {}: {}",
            validator.kind(),
            source,
            value
        );
        counter!(ANNOTATION_INVALID_VALUE, "annotation" => key.to_string()).increment(1);
        false
    }

    /// Every declaration of `key`, in the order they were added.
    pub fn get_str_map(&self, key: &str) -> Option<&[Map]> {
        self.maps
            .get(key)
            .filter(|maps| !maps.is_empty())
            .map(Vec::as_slice)
    }

    /// Sources whose value for `key` differs from the canonical one, without
    /// repetition and in declaration order.
    fn conflicting_sources(&self, key: &str) -> Vec<&Source> {
        let mut sources: Vec<&Source> = Vec::new();
        if let Some((canonical, others)) = self.maps.get(key).and_then(|maps| maps.split_first()) {
            for map in others {
                if map.value != canonical.value && !sources.contains(&&map.source) {
                    sources.push(&map.source);
                }
            }
        }
        sources
    }

    /// Groups the paths of `backend` by the values of `keys` resolved on each
    /// of them.
    pub fn get_backend_config(
        &self,
        backend: &Backend,
        keys: &[&str],
    ) -> Vec<BackendConfig<BTreeMap<String, String>>> {
        group_paths(&backend.paths, |path| self.resolve_keys(path, keys))
    }

    /// Same as `get_backend_config`, grouping on the value `convert` builds
    /// from the resolved keys of each path.
    pub fn get_backend_config_with<T, F>(
        &self,
        backend: &Backend,
        keys: &[&str],
        mut convert: F,
    ) -> Vec<BackendConfig<T>>
    where
        T: PartialEq,
        F: FnMut(&BTreeMap<String, String>) -> T,
    {
        group_paths(&backend.paths, |path| convert(&self.resolve_keys(path, keys)))
    }

    pub fn get_backend_config_str(&self, backend: &Backend, key: &str) -> Vec<BackendConfig<String>> {
        group_paths(&backend.paths, |path| self.resolve(path, key))
    }

    fn resolve_keys(&self, path: &BackendPath, keys: &[&str]) -> BTreeMap<String, String> {
        keys.iter()
            .map(|key| (key.to_string(), self.resolve(path, key)))
            .collect()
    }

    /// Value of `key` declared on `path`, or its default if undeclared or
    /// rejected by the key's validator.
    fn resolve(&self, path: &BackendPath, key: &str) -> String {
        let default = self.config.default_value(key);
        let Some(map) = self
            .maps
            .get(key)
            .and_then(|maps| maps.iter().find(|map| map.scope == path.hostpath))
        else {
            return default.to_string();
        };

        if !self.is_accepted(key, &map.source, &map.value) {
            return default.to_string();
        }

        map.value.clone()
    }
}
