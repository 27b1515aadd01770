//! Synthesis of proxy backend configuration from ingress annotations.
//!
//! Every resource routing to a backend contributes its annotations to the
//! backend's [`Mapper`]; the [`Updater`] then runs the builders turning the
//! merged annotations into the typed fields of [`Backend`].

pub mod bluegreen;
pub mod builders;
pub mod cache;
pub mod config;
pub mod errors;
pub mod grouping;
pub mod keys;
pub mod mapper;
pub mod metrics_defs;
pub mod registry;
pub mod source;
pub mod types;

#[cfg(test)]
mod testutils;

pub use builders::{BackendData, Updater};
pub use cache::{Labels, MemoryCache, PodStore, SecretStore};
pub use config::{AnnotationConfig, ValidationError, Validator};
pub use errors::{BalanceError, LookupError};
pub use mapper::{MapBuilder, Mapper};
pub use registry::Registry;
pub use source::Source;
pub use types::{Backend, BackendId, Endpoint, Userlist};
