//! Transformation module.
//!
//! This module turns accepted rows into the result tree:
//! - Expand: code → long-form substitution
//! - Grouper: group rows and fold leaf records
//! - Tree: nested result tree and deep merge
//! - Pipeline: the full run, from source to tree

pub mod expand;
pub mod grouper;
pub mod pipeline;
pub mod tree;

pub use expand::{expand_fields, ExpansionTable};
pub use grouper::{merge_groups, Group, GroupAggregator};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};
pub use tree::{LeafRecord, ResultTree};
