//! Row validation.
//!
//! Validation never fails a run: each check annotates rows, and the
//! partitioner splits them afterwards.
//!
//! # Check order
//!
//! 1. Completeness (always first): column count and blank required fields
//! 2. Every configured [`ValidationRule`], in config order
//!
//! # Example
//!
//! ```rust,ignore
//! use rowfold::validation::{partition, RowValidator};
//!
//! let validator = RowValidator::from_config(&config);
//! let rows = validator.validate(&table);
//! let part = partition(rows, &table);
//! assert_eq!(part.accepted.len() + part.rejected.len(), table.len());
//! ```

pub mod engine;
pub mod rules;
pub mod validators;

pub use engine::{partition, Partition, RowValidator, ERR_INCOMPLETE_ROW};
pub use rules::{ValidationRule, DEFAULT_DATE_FORMAT};
pub use validators::{is_integer, is_member, is_non_blank, is_numeric, is_valid_date};
