/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for scheme configuration.
//!
//! Engine operations (parsing, rendering, domain lookups, ordering) never
//! fail: they return empty or `None` results instead. Errors are reserved
//! for loading a scheme set and for explicit "must exist" lookups.

use thiserror::Error;

/// Errors raised while loading or querying a scheme set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    /// A regular expression in the scheme set does not compile.
    #[error("Invalid pattern '{pattern}' in scheme '{scheme}': {message}")]
    InvalidPattern {
        scheme: String,
        pattern: String,
        message: String,
    },

    /// The scheme path names a step that has no definition.
    #[error("Scheme '{scheme}' path references undefined step '{step}'")]
    UnknownPathStep { scheme: String, step: String },

    /// `optionalFrom` names a step outside the scheme path.
    #[error("Scheme '{scheme}' has optionalFrom '{step}' which is not in its path")]
    InvalidOptionalFrom { scheme: String, step: String },

    /// The serialized settings could not be read or written.
    #[error("Invalid scheme settings: {0}")]
    InvalidSettings(String),

    /// No scheme is registered under the given id.
    #[error("Scheme '{id}' not found")]
    SchemeNotFound { id: String },

    /// The scheme has no step with the given id.
    #[error("Step '{step}' not found in scheme '{scheme}'")]
    StepNotFound { scheme: String, step: String },
}

impl From<serde_json::Error> for SchemeError {
    fn from(err: serde_json::Error) -> Self {
        SchemeError::InvalidSettings(err.to_string())
    }
}

impl From<serde_yaml::Error> for SchemeError {
    fn from(err: serde_yaml::Error) -> Self {
        SchemeError::InvalidSettings(err.to_string())
    }
}

/// Result type alias for scheme configuration operations.
pub type Result<T> = std::result::Result<T, SchemeError>;
