//! Domain error types
//!
//! This module defines the error hierarchy for Vigil. All errors are
//! domain-specific and don't expose third-party types.

use super::hierarchy::HierarchyLevel;
use thiserror::Error;

/// Main Vigil error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Blank or missing required name, missing required parent scope,
    /// malformed filter value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced id or name does not resolve at the given level
    #[error("{level} not found: {reference}")]
    NotFound {
        level: HierarchyLevel,
        reference: String,
    },

    /// A facility id supplied by the caller does not resolve
    #[error("Facility not found: {0}")]
    FacilityNotFound(String),

    /// Two records satisfy the same uniqueness key
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store rejected a read or write
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The store is unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl VigilError {
    /// Creates a `NotFound` error for a hierarchy level
    pub fn not_found(level: HierarchyLevel, reference: impl Into<String>) -> Self {
        VigilError::NotFound {
            level,
            reference: reference.into(),
        }
    }

    /// Whether the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, VigilError::Persistence(_) | VigilError::Connection(_))
    }

    /// Whether this is a uniqueness conflict reported by the store
    pub fn is_conflict(&self) -> bool {
        matches!(self, VigilError::Conflict(_))
    }
}

impl From<std::io::Error> for VigilError {
    fn from(err: std::io::Error) -> Self {
        VigilError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        VigilError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VigilError {
    fn from(err: toml::de::Error) -> Self {
        VigilError::Configuration(format!("TOML parse error: {err}"))
    }
}
