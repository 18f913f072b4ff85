//! # Rowfold - config-driven validation and grouped aggregation of delimited data
//!
//! Rowfold reads a delimited source, validates every record against a named
//! transform config, sets rejected records aside with their diagnostics, and
//! folds the accepted ones into a nested JSON tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌──────────────┐
//! │ CSV file │──▶│  Parser  │──▶│ Validation │──▶│  Expand  │──▶│ Group + fold │
//! │ (any enc)│   │(auto-enc)│   │ + partition│   │  codes   │   │ → ResultTree │
//! └──────────┘   └──────────┘   └─────┬──────┘   └──────────┘   └──────┬───────┘
//!                                     │ rejected                       │ result
//!                                     ▼                                ▼
//!                               ┌──────────────────────────────────────────┐
//!                               │   DocumentStore  (+ JSON output file)    │
//!                               └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowfold::{Pipeline, TransformRegistry};
//! use std::path::Path;
//!
//! let config = TransformRegistry::new().load("sales-summary")?;
//! let outcome = Pipeline::new(config).run_file(Path::new("sales.csv"))?;
//! println!("{}", rowfold::render_json(&outcome.tree)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per boundary
//! - [`models`] - Field values, source records, working rows
//! - [`config`] - Application and transform configuration
//! - [`registry`] - Transform lookup by name
//! - [`parser`] - Delimited source reading with auto-detection
//! - [`validation`] - Row checks and partitioning
//! - [`transform`] - Expansion, grouping, result tree, pipeline
//! - [`store`] - Document stores for rejected rows and results
//! - [`output`] - JSON rendering
//! - [`telemetry`] - Tracing setup

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod registry;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Persistence and output
pub mod output;
pub mod store;

// Logging
pub mod telemetry;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError, ConfigError, IngestError, PipelineError, PipelineResult, StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{FieldValue, RejectedBatch, RejectedRow, Row, RowId, SourceRecord, SourceTable};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{
    AggregateOp, AppConfig, LeafField, LoggingConfig, StoreConfig, StoreKind, TransformConfig,
};
pub use registry::TransformRegistry;

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_str, read_source,
    ParseResult,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{partition, Partition, RowValidator, ValidationRule};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    expand_fields, GroupAggregator, LeafRecord, Pipeline, ResultTree, RunOutcome, RunSummary,
};

// =============================================================================
// Re-exports - Store and Output
// =============================================================================

pub use output::{render_json, write_json};
pub use store::{open_store, persist_run, DocumentStore, StoredDocument};
