//! Builders turning the merged annotations of a backend into its typed
//! configuration.
//!
//! Builders never fail the pass: an unusable annotation is logged and the
//! related feature is either disabled or configured with its default.

mod affinity;
mod auth;
mod hsts;
mod oauth;
mod rewrite;
mod waf;
mod whitelist;

use crate::bluegreen;
use crate::cache::{PodStore, SecretStore};
use crate::keys;
use crate::mapper::{Mapper, Value};
use crate::metrics_defs::{BUILDER_REJECTED, counter};
use crate::registry::Registry;
use crate::source;
use crate::types::{Backend, Userlist};
use indexmap::IndexMap;

/// A backend and the annotations declared for it.
#[derive(Clone, Debug)]
pub struct BackendData {
    pub backend: Backend,
    pub mapper: Mapper,
}

impl BackendData {
    pub fn new(backend: Backend, mapper: Mapper) -> Self {
        BackendData { backend, mapper }
    }
}

/// Runs the builders of every backend of a pass.
///
/// Userlists are shared between backends: a secret referenced by several
/// backends is read and registered once.
pub struct Updater<'a> {
    secrets: &'a dyn SecretStore,
    pods: &'a dyn PodStore,
    registry: &'a Registry,
    userlists: IndexMap<String, Userlist>,
}

impl<'a> Updater<'a> {
    pub fn new(secrets: &'a dyn SecretStore, pods: &'a dyn PodStore, registry: &'a Registry) -> Self {
        Updater {
            secrets,
            pods,
            registry,
            userlists: IndexMap::new(),
        }
    }

    pub fn update_backend_config(&mut self, data: &mut BackendData) {
        affinity::build(data);
        auth::build(data, self.secrets, &mut self.userlists);
        self.build_blue_green(data);
        hsts::build(data);
        oauth::build(data, self.registry);
        rewrite::build(data);
        waf::build(data);
        whitelist::build_http(data);
        whitelist::build_tcp(data);
    }

    fn build_blue_green(&self, data: &mut BackendData) {
        let balance = data.mapper.get_str(keys::BLUE_GREEN_BALANCE);
        if balance.value.is_empty() {
            return;
        }
        let mode = data.mapper.get_str_value(keys::BLUE_GREEN_MODE);
        bluegreen::apply_balance(
            &mut data.backend.endpoints,
            balance.value,
            mode,
            self.pods,
            balance.source,
        );
    }

    /// Userlists registered so far, in registration order.
    pub fn userlists(&self) -> impl Iterator<Item = &Userlist> {
        self.userlists.values()
    }

    pub fn into_userlists(self) -> Vec<Userlist> {
        self.userlists.into_values().collect()
    }
}

/// Counts a feature disabled on a backend.
fn rejected(builder: &'static str) {
    counter!(BUILDER_REJECTED, "builder" => builder).increment(1);
}

/// Source rendering used by builders reading a single annotation.
fn describe(value: &Value<'_>) -> String {
    source::describe(value.source)
}
