//! Error types for oak-analyzer
//!
//! Provides unified error handling across the crate. Per-item failures
//! (one malformed definition, one unresolvable entity) are logged and dropped
//! by the scanners; the variants here cover the conditions that stop a whole
//! operation.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for oak-analyzer operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read at all
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parse error (grammar load failure or a tree with error nodes where a
    /// clean parse is required)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Query or update against an index that was never initialized
    #[error("{index} is not initialized")]
    NotInitialized { index: String },

    /// Entry file of a program is missing or unparsable
    #[error("Entry file {} of {index} cannot be used: {reason}", path.display())]
    Entry {
        index: String,
        path: PathBuf,
        reason: String,
    },

    /// Domain scan failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker supervisor error
    #[error("Worker error: {0}")]
    Worker(String),
}

impl AnalyzerError {
    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        AnalyzerError::Parse(msg.into())
    }

    pub fn not_initialized(index: impl Into<String>) -> Self {
        AnalyzerError::NotInitialized {
            index: index.into(),
        }
    }
}

/// Typed failure of a whole domain scan.
///
/// Serializes as `{ "error": "<message>" }`, which is the shape handed to the
/// editor layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Another scan is running; concurrent calls are rejected, not queued
    #[error("domain analysis is already in progress")]
    InProgress,

    /// The schema registry file does not exist (code generation has not run)
    #[error("schema registry {} not found, run the domain build first", .0.display())]
    RegistryMissing(PathBuf),

    /// The schema registry exists but cannot be used
    #[error("schema registry {} is invalid: {reason}", path.display())]
    RegistryInvalid { path: PathBuf, reason: String },
}

impl serde::Serialize for DomainError {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.to_string())?;
        map.end()
    }
}

/// Result type alias for oak-analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
