//! Group accepted rows and fold them into leaf records.
//!
//! # Architecture
//!
//! ```text
//! Accepted rows (flat)                   →  Result tree
//! ┌──────────────────────────────────┐      ┌──────────────────────────────┐
//! │ MENA, Offline, Libya,   8446     │      │ MENA                         │
//! │ MENA, Offline, Libya,   1517     │  →   │  └ Offline                   │
//! │ Asia, Online,  Japan,   3322     │      │     └ [{Libya, 9963}]        │
//! └──────────────────────────────────┘      │ Asia                         │
//!                                           │  └ Online                    │
//!                                           │     └ [{Japan, 3322}]        │
//!                                           └──────────────────────────────┘
//! ```
//!
//! Inside a group, a new row folds into an existing leaf record when every
//! identity field matches; its sum and average fields are then combined
//! with the existing values. Otherwise it is appended as a new leaf.
//!
//! Averages are pairwise: `(existing + new) / 2`, rounded to 2 decimals at
//! every fold. With more than two rows this is not the arithmetic mean.

use std::collections::HashMap;
use tracing::debug;

use super::tree::{LeafRecord, ResultTree};
use crate::config::{AggregateOp, LeafField, TransformConfig};
use crate::error::{AggregateError, AggregateResult};
use crate::models::{FieldValue, Row};

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Combine two numbers with `op`.
///
/// Integer sums stay integers unless they overflow. Identity returns the
/// existing value.
pub fn fold_values(op: AggregateOp, existing: &FieldValue, new: f64) -> FieldValue {
    match op {
        AggregateOp::Identity => existing.clone(),
        AggregateOp::Sum => match existing {
            FieldValue::Integer(a) if new.fract() == 0.0 && new.abs() < i64::MAX as f64 => {
                match a.checked_add(new as i64) {
                    Some(total) => FieldValue::Integer(total),
                    None => FieldValue::Float(round2(*a as f64 + new)),
                }
            }
            other => FieldValue::Float(round2(other.as_f64().unwrap_or(0.0) + new)),
        },
        AggregateOp::Average => {
            FieldValue::Float(round2((existing.as_f64().unwrap_or(0.0) + new) / 2.0))
        }
    }
}

/// One group: its key path and folded leaf records, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<String>,
    pub leaves: Vec<LeafRecord>,
}

/// Merge the single-path tree of every group into one tree.
pub fn merge_groups(groups: Vec<Group>) -> ResultTree {
    groups.into_iter().fold(ResultTree::new(), |tree, group| {
        tree.merged(ResultTree::from_path(&group.key, group.leaves))
    })
}

/// Groups rows by key fields and folds their leaf fields.
#[derive(Debug, Clone)]
pub struct GroupAggregator {
    group_by: Vec<String>,
    leaf_fields: Vec<LeafField>,
}

impl GroupAggregator {
    pub fn new(group_by: Vec<String>, leaf_fields: Vec<LeafField>) -> Self {
        Self {
            group_by,
            leaf_fields,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.group_by.clone(), config.leaf_fields.clone())
    }

    /// Group and fold `rows`. Groups and leaves keep first-seen order.
    pub fn aggregate(&self, rows: &[Row]) -> AggregateResult<Vec<Group>> {
        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();

        for row in rows {
            let key = self.group_key(row);
            let leaf = self.leaf_record(row)?;

            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(Group {
                    key,
                    leaves: Vec::new(),
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];

            match group.leaves.iter_mut().find(|e| self.same_identity(e, &leaf)) {
                Some(existing) => {
                    debug!(row = %row.id(), group = ?group.key, "Folding row into existing leaf");
                    self.fold_into(existing, &leaf);
                }
                None => group.leaves.push(leaf),
            }
        }

        Ok(groups)
    }

    /// Group, fold and merge everything into one tree.
    pub fn build_tree(&self, rows: &[Row]) -> AggregateResult<ResultTree> {
        Ok(merge_groups(self.aggregate(rows)?))
    }

    fn group_key(&self, row: &Row) -> Vec<String> {
        self.group_by
            .iter()
            .map(|field| {
                row.get(field)
                    .map(|v| v.as_text().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Project a row onto the leaf fields. Aggregated fields must be numbers.
    fn leaf_record(&self, row: &Row) -> AggregateResult<LeafRecord> {
        let mut leaf = LeafRecord::new();
        for spec in &self.leaf_fields {
            let value = row
                .get(&spec.source)
                .cloned()
                .unwrap_or_else(|| FieldValue::Text(String::new()));

            let value = match (spec.op, value) {
                (AggregateOp::Identity, v) => v,
                (_, FieldValue::Text(text)) => match text.trim().parse::<f64>() {
                    Ok(n) => FieldValue::Float(n),
                    Err(_) => {
                        return Err(AggregateError::NonNumeric {
                            row: row.id().0,
                            field: spec.source.clone(),
                            value: text,
                        })
                    }
                },
                (_, number) => number,
            };
            leaf.insert(spec.output.clone(), value);
        }
        Ok(leaf)
    }

    fn same_identity(&self, existing: &LeafRecord, candidate: &LeafRecord) -> bool {
        self.leaf_fields
            .iter()
            .filter(|spec| spec.op.is_identity())
            .all(|spec| existing.get(&spec.output) == candidate.get(&spec.output))
    }

    fn fold_into(&self, existing: &mut LeafRecord, new: &LeafRecord) {
        for spec in self.leaf_fields.iter().filter(|s| !s.op.is_identity()) {
            let (Some(current), Some(incoming)) = (
                existing.get(&spec.output),
                new.get(&spec.output).and_then(FieldValue::as_f64),
            ) else {
                continue;
            };
            let folded = fold_values(spec.op, current, incoming);
            existing.insert(spec.output.clone(), folded);
        }
    }
}
