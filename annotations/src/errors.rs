use std::num::ParseIntError;
use thiserror::Error;

/// Failures of the in-memory collaborators (secrets and pods).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("secret not found: '{0}'")]
    SecretNotFound(String),

    #[error("secret '{secret}' does not have file/key '{key}'")]
    MissingKey { secret: String, key: String },

    #[error("pod not found: '{0}'")]
    PodNotFound(String),
}

/// Reasons a blue/green balance expression is rejected as a whole.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error("invalid weight format: {0}")]
    InvalidFormat(String),

    #[error("invalid weight value: {0}")]
    InvalidWeight(#[from] ParseIntError),

    #[error("invalid weight normalization: arithmetic overflow")]
    Overflow,
}
