//! Transform configuration: what to validate, expand, group and fold.
//!
//! A transform file is read into a loose [`TransformFile`] first and then
//! checked into a [`TransformConfig`]. Every field a rule, expansion, group
//! or leaf names must be one of `source_fields`, so later stages never look
//! up a field that cannot exist.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::validation::rules::ValidationRule;

/// How a leaf field combines when two rows fold together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    /// Part of the match key; never combined.
    #[default]
    Identity,
    /// Running total, rounded to 2 decimals on each fold.
    Sum,
    /// Pairwise running average `(existing + new) / 2`, rounded to 2 decimals.
    #[serde(alias = "avg")]
    Average,
}

impl AggregateOp {
    pub fn is_identity(self) -> bool {
        self == AggregateOp::Identity
    }
}

/// One output field of a leaf record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafField {
    /// Source field name.
    pub source: String,
    /// Output field name.
    pub output: String,
    pub op: AggregateOp,
}

impl LeafField {
    pub fn new(source: impl Into<String>, output: impl Into<String>, op: AggregateOp) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            op,
        }
    }

    pub fn identity(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(source, output, AggregateOp::Identity)
    }
}

/// Leaf field as written in YAML: a bare name or a full mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawLeafField {
    Name(String),
    Mapping {
        source: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        op: AggregateOp,
    },
}

impl From<RawLeafField> for LeafField {
    fn from(raw: RawLeafField) -> Self {
        match raw {
            RawLeafField::Name(name) => LeafField::identity(name.clone(), name),
            RawLeafField::Mapping { source, output, op } => {
                let output = output.unwrap_or_else(|| source.clone());
                LeafField::new(source, output, op)
            }
        }
    }
}

/// Transform file as deserialized, before any invariant is checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformFile {
    #[serde(default)]
    source_fields: Option<Vec<String>>,
    #[serde(default)]
    required_fields: Option<Vec<String>>,
    #[serde(default)]
    delimiter: Option<char>,
    #[serde(default)]
    checks: Vec<ValidationRule>,
    #[serde(default, alias = "expand_output")]
    expand: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    group_by: Option<Vec<String>>,
    #[serde(default)]
    leaf_fields: Option<Vec<RawLeafField>>,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// A validated transform configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformConfig {
    pub name: String,
    /// Expected source fields, in source order.
    pub source_fields: Vec<String>,
    /// Fields that must be non-blank for a row to be complete.
    pub required_fields: Vec<String>,
    /// Source delimiter; detected from the header when absent.
    pub delimiter: Option<char>,
    /// Validation checks, applied in this order after completeness.
    pub checks: Vec<ValidationRule>,
    /// Field → (code → replacement) lookups applied to accepted rows.
    pub expand: BTreeMap<String, BTreeMap<String, String>>,
    /// Grouping fields; the result tree nests in this order.
    pub group_by: Vec<String>,
    pub leaf_fields: Vec<LeafField>,
    pub output_file: Option<PathBuf>,
}

impl TransformConfig {
    /// Read and validate a transform file.
    pub fn load(name: &str, path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(name, &content, path)
    }

    /// Parse and validate transform YAML held in memory.
    pub fn from_yaml_str(name: &str, content: &str) -> ConfigResult<Self> {
        Self::parse(name, content, Path::new(name))
    }

    fn parse(name: &str, content: &str, origin: &Path) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Err(ConfigError::Empty(origin.to_path_buf()));
        }
        let file: TransformFile =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_file(name, file)
    }

    /// Check a deserialized file against the configuration invariants.
    pub fn from_file(name: &str, file: TransformFile) -> ConfigResult<Self> {
        let source_fields = file
            .source_fields
            .ok_or(ConfigError::MissingKey("source_fields"))?;
        if source_fields.is_empty() {
            return Err(ConfigError::invalid("source_fields", "must list at least one field"));
        }
        let known: BTreeSet<&str> = source_fields.iter().map(String::as_str).collect();
        if known.len() != source_fields.len() {
            return Err(ConfigError::invalid("source_fields", "field names must be unique"));
        }
        let require_known = |key: &str, field: &str| -> ConfigResult<()> {
            if known.contains(field) {
                Ok(())
            } else {
                Err(ConfigError::invalid(
                    key,
                    format!("'{}' is not a source field", field),
                ))
            }
        };

        let group_by = file.group_by.ok_or(ConfigError::MissingKey("group_by"))?;
        if group_by.is_empty() {
            return Err(ConfigError::invalid("group_by", "must list at least one field"));
        }
        let leaf_fields: Vec<LeafField> = file
            .leaf_fields
            .ok_or(ConfigError::MissingKey("leaf_fields"))?
            .into_iter()
            .map(LeafField::from)
            .collect();
        if leaf_fields.is_empty() {
            return Err(ConfigError::invalid("leaf_fields", "must list at least one field"));
        }

        let required_fields = file
            .required_fields
            .unwrap_or_else(|| source_fields.clone());

        for field in &required_fields {
            require_known("required_fields", field)?;
        }
        for rule in &file.checks {
            for field in rule.fields() {
                require_known(&format!("checks.{}", rule.kind()), field)?;
            }
        }
        for field in file.expand.keys() {
            require_known("expand", field)?;
        }
        for field in &group_by {
            require_known("group_by", field)?;
        }

        let mut outputs = BTreeSet::new();
        for leaf in &leaf_fields {
            require_known("leaf_fields", &leaf.source)?;
            if !outputs.insert(leaf.output.as_str()) {
                return Err(ConfigError::invalid(
                    "leaf_fields",
                    format!("output name '{}' used twice", leaf.output),
                ));
            }
            if leaf.op.is_identity() {
                continue;
            }
            if group_by.contains(&leaf.source) {
                return Err(ConfigError::invalid(
                    "leaf_fields",
                    format!("grouping field '{}' must use the identity operator", leaf.source),
                ));
            }
            if file.expand.contains_key(&leaf.source) {
                return Err(ConfigError::invalid(
                    "expand",
                    format!("aggregated field '{}' cannot be expanded", leaf.source),
                ));
            }
            if !file.checks.iter().any(|r| r.coerces(&leaf.source)) {
                return Err(ConfigError::invalid(
                    "leaf_fields",
                    format!(
                        "aggregated field '{}' needs a numeric or integer check",
                        leaf.source
                    ),
                ));
            }
        }

        Ok(Self {
            name: name.to_string(),
            source_fields,
            required_fields,
            delimiter: file.delimiter,
            checks: file.checks,
            expand: file.expand,
            group_by,
            leaf_fields,
            output_file: file.output_file,
        })
    }
}
