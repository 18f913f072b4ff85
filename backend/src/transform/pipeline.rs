//! High-level pipeline: source → validate → partition → expand → group → tree.
//!
//! # Example
//!
//! ```rust,ignore
//! use rowfold::{Pipeline, TransformRegistry};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TransformRegistry::new().load("sales-summary")?;
//!     let outcome = Pipeline::new(config).run_file(Path::new("sales.csv"))?;
//!
//!     println!("{} rows accepted", outcome.summary.accepted);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use super::expand::expand_fields;
use super::grouper::{merge_groups, GroupAggregator};
use super::tree::ResultTree;
use crate::config::TransformConfig;
use crate::error::PipelineResult;
use crate::models::{RejectedBatch, Row, SourceTable};
use crate::parser::read_source;
use crate::validation::engine::{partition, Partition, RowValidator};

/// Counts reported after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub transform: String,
    /// Data records read from the source.
    pub ingested: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Distinct group key paths.
    pub groups: usize,
    pub leaf_records: usize,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Accepted rows after coercion and expansion.
    pub accepted: Vec<Row>,
    pub rejected: RejectedBatch,
    pub tree: ResultTree,
}

/// One configured transform, ready to run against sources.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: TransformConfig,
    validator: RowValidator,
    aggregator: GroupAggregator,
}

impl Pipeline {
    pub fn new(config: TransformConfig) -> Self {
        let validator = RowValidator::from_config(&config);
        let aggregator = GroupAggregator::from_config(&config);
        Self {
            config,
            validator,
            aggregator,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Read the source file and run the full pipeline over it.
    pub fn run_file(&self, path: &Path) -> PipelineResult<RunOutcome> {
        let parsed = read_source(path, &self.config.source_fields, self.config.delimiter)?;
        info!(
            encoding = %parsed.encoding,
            delimiter = %parsed.delimiter.escape_default(),
            "Source decoded"
        );
        self.run(&parsed.table)
    }

    /// Validate and partition only; nothing is grouped.
    pub fn validate(&self, source: &SourceTable) -> Partition {
        info!(transform = %self.config.name, records = source.len(), "Validating records");
        let rows = self.validator.validate(source);
        partition(rows, source)
    }

    /// Run the full pipeline over an ingested table.
    pub fn run(&self, source: &SourceTable) -> PipelineResult<RunOutcome> {
        let Partition {
            mut accepted,
            rejected,
        } = self.validate(source);
        info!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            "Partitioned records"
        );

        if !self.config.expand.is_empty() {
            let replaced = expand_fields(&mut accepted, &self.config.expand);
            info!(replaced, "Expanded codes");
        }

        let groups = self.aggregator.aggregate(&accepted)?;
        let group_count = groups.len();
        let tree = merge_groups(groups);
        if accepted.is_empty() {
            warn!(transform = %self.config.name, "No accepted rows; result tree is empty");
        }

        let summary = RunSummary {
            transform: self.config.name.clone(),
            ingested: source.len(),
            accepted: accepted.len(),
            rejected: rejected.len(),
            groups: group_count,
            leaf_records: tree.leaf_count(),
        };
        info!(
            groups = summary.groups,
            leaf_records = summary.leaf_records,
            "Result tree built"
        );

        Ok(RunOutcome {
            summary,
            accepted,
            rejected: RejectedBatch::from(rejected),
            tree,
        })
    }
}
