//! Error types for the rowfold pipeline.
//!
//! This module defines one error type per boundary:
//!
//! - [`ConfigError`] - application and transform configuration
//! - [`IngestError`] - reading the delimited source
//! - [`AggregateError`] - folding values during grouping
//! - [`StoreError`] - document store persistence
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Row-level validation failures are not errors: a rejected row is data
//! carried in [`crate::models::Row`], never an `Err`.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected shape.
    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Configuration document has no content.
    #[error("Config file {0} is empty")]
    Empty(PathBuf),

    /// A required key is absent.
    #[error("Missing required config key: {0}")]
    MissingKey(&'static str),

    /// A key is present but its value breaks an invariant.
    #[error("Invalid config value for '{key}': {message}")]
    Invalid { key: String, message: String },

    /// No transform config exists under the given name.
    #[error("Transform not found: {0}")]
    TransformNotFound(String),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while reading the delimited source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source file does not exist.
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the source.
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// Source has no header row at all.
    #[error("Source is empty")]
    EmptySource,

    /// CSV reader failure.
    #[error("Invalid delimited data: {0}")]
    Csv(#[from] csv::Error),

    /// Bytes could not be decoded.
    #[error("Failed to decode source: {0}")]
    Encoding(String),

    /// Delimiter is not a single-byte character.
    #[error("Delimiter must be an ASCII character, got '{0}'")]
    InvalidDelimiter(char),
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors while folding leaf records.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A sum or average field holds a value that is not a number.
    #[error("Row {row}: field '{field}' is not numeric (value '{value}')")]
    NonNumeric {
        row: usize,
        field: String,
        value: String,
    },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite failure.
    #[error("Store SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Store target is unusable (bad path, bad name).
    #[error("Invalid store target: {0}")]
    InvalidTarget(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::Pipeline`]
/// and the CLI commands. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Ingestion error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Aggregation error.
    #[error("Aggregate error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Persistence error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Writing the output file failed.
    #[error("Cannot write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Result tree could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for aggregation operations.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // IngestError -> PipelineError
        let ingest_err = IngestError::EmptySource;
        let pipeline_err: PipelineError = ingest_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // ConfigError -> PipelineError
        let config_err = ConfigError::MissingKey("source_fields");
        let pipeline_err: PipelineError = config_err.into();
        assert!(pipeline_err.to_string().contains("source_fields"));
    }

    #[test]
    fn test_aggregate_error_format() {
        let err = AggregateError::NonNumeric {
            row: 3,
            field: "Units Sold".into(),
            value: "many".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 3"));
        assert!(msg.contains("Units Sold"));
        assert!(msg.contains("many"));
    }

    #[test]
    fn test_invalid_helper() {
        let err = ConfigError::invalid("group_by", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid config value for 'group_by': must not be empty"
        );
    }
}
