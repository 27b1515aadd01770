use crate::keys;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Empty annotation key in {0}")]
    EmptyKey(&'static str),

    #[error("Default value '{value}' of annotation '{key}' is not a valid {kind}")]
    InvalidDefault {
        key: String,
        value: String,
        kind: &'static str,
    },
}

/// Value check applied to explicitly declared annotation values.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    Int,
    Bool,
}

impl Validator {
    pub fn kind(&self) -> &'static str {
        match self {
            Validator::Int => "int",
            Validator::Bool => "bool",
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            Validator::Int => value.parse::<i64>().is_ok(),
            Validator::Bool => parse_bool(value).is_some(),
        }
    }

    /// Validators the engine always applies unless the config overrides them.
    fn builtin(key: &str) -> Option<Validator> {
        match key {
            keys::HSTS
            | keys::HSTS_INCLUDE_SUBDOMAINS
            | keys::HSTS_PRELOAD
            | keys::SESSION_COOKIE_DYNAMIC => Some(Validator::Bool),
            keys::HSTS_MAX_AGE => Some(Validator::Int),
            _ => None,
        }
    }
}

/// Boolean literals accepted in annotations.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Annotation settings shared by every mapper created in a pass.
///
/// Built once by the caller and handed to the `MapBuilder`; it is never
/// mutated while backends are being resolved.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Controller prefix, only used to name annotations in log messages
    /// (e.g. "ingress.kubernetes.io/")
    pub prefix: String,
    /// Value used when no resource declares the annotation
    pub defaults: BTreeMap<String, String>,
    /// Extra validators, taking precedence over the built-in ones
    pub validators: BTreeMap<String, Validator>,
}

impl AnnotationConfig {
    pub fn new<P: Into<String>>(prefix: P, defaults: BTreeMap<String, String>) -> Self {
        AnnotationConfig {
            prefix: prefix.into(),
            defaults,
            validators: BTreeMap::new(),
        }
    }

    pub fn with_validator<K: Into<String>>(mut self, key: K, validator: Validator) -> Self {
        self.validators.insert(key.into(), validator);
        self
    }

    pub fn default_value(&self, key: &str) -> &str {
        self.defaults.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn validator(&self, key: &str) -> Option<Validator> {
        self.validators
            .get(key)
            .copied()
            .or_else(|| Validator::builtin(key))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.defaults.keys().any(|key| key.is_empty()) {
            return Err(ValidationError::EmptyKey("defaults"));
        }
        if self.validators.keys().any(|key| key.is_empty()) {
            return Err(ValidationError::EmptyKey("validators"));
        }

        for (key, value) in &self.defaults {
            if value.is_empty() {
                continue;
            }
            if let Some(validator) = self.validator(key)
                && !validator.is_valid(value)
            {
                return Err(ValidationError::InvalidDefault {
                    key: key.clone(),
                    value: value.clone(),
                    kind: validator.kind(),
                });
            }
        }

        Ok(())
    }
}
