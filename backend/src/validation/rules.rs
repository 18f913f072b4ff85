//! Validation rule definitions.
//!
//! Rules are configured in the transform YAML as an ordered list of tagged
//! entries:
//!
//! ```yaml
//! checks:
//!   - check: membership
//!     fields:
//!       Sales Channel: [Online, Offline]
//!   - check: date
//!     format: "%m/%d/%Y"
//!     fields: [Order Date, Ship Date]
//!   - check: numeric
//!     fields: [Unit Price, Unit Cost]
//!   - check: integer
//!     fields: [Units Sold]
//!   - check: non_blank
//!     fields: [Country]
//! ```
//!
//! The set of check kinds is closed: an unknown `check` name fails when the
//! configuration is parsed, before any row is read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Date pattern used when a date check does not name one.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// One configured validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Field value must be one of the allowed values.
    ///
    /// Fields are checked in the order they are declared.
    #[serde(alias = "data_validations")]
    Membership {
        fields: IndexMap<String, BTreeSet<String>>,
    },

    /// Field value must parse under the date pattern.
    #[serde(alias = "date_field")]
    Date {
        fields: Vec<String>,
        #[serde(default = "default_date_format")]
        format: String,
    },

    /// Field value must be a number; valid values become floats.
    #[serde(alias = "float_field")]
    Numeric { fields: Vec<String> },

    /// Field value must be ASCII digits; valid values become integers.
    #[serde(alias = "number_field")]
    Integer { fields: Vec<String> },

    /// Field value must not be blank.
    NonBlank { fields: Vec<String> },
}

impl ValidationRule {
    /// Configuration name of the check kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationRule::Membership { .. } => "membership",
            ValidationRule::Date { .. } => "date",
            ValidationRule::Numeric { .. } => "numeric",
            ValidationRule::Integer { .. } => "integer",
            ValidationRule::NonBlank { .. } => "non_blank",
        }
    }

    /// Fields this check inspects.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationRule::Membership { fields } => fields.keys().map(String::as_str).collect(),
            ValidationRule::Date { fields, .. }
            | ValidationRule::Numeric { fields }
            | ValidationRule::Integer { fields }
            | ValidationRule::NonBlank { fields } => fields.iter().map(String::as_str).collect(),
        }
    }

    /// A check with no fields is listed but does nothing.
    pub fn is_unconfigured(&self) -> bool {
        match self {
            ValidationRule::Membership { fields } => fields.is_empty(),
            ValidationRule::Date { fields, .. }
            | ValidationRule::Numeric { fields }
            | ValidationRule::Integer { fields }
            | ValidationRule::NonBlank { fields } => fields.is_empty(),
        }
    }

    /// Whether this check coerces `field` to a number when valid.
    pub fn coerces(&self, field: &str) -> bool {
        match self {
            ValidationRule::Numeric { fields } | ValidationRule::Integer { fields } => {
                fields.iter().any(|f| f == field)
            }
            _ => false,
        }
    }
}
