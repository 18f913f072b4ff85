//! Row validation engine and partitioner.
//!
//! The engine builds a working [`Row`] for every ingested record and runs the
//! mandatory completeness check followed by the configured rules in order.
//! A row that fails completeness is skipped by every later check, since its
//! fields cannot be trusted to exist.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::rules::ValidationRule;
use super::validators::{is_integer, is_member, is_non_blank, is_numeric, is_valid_date};
use crate::config::TransformConfig;
use crate::models::{FieldValue, RejectedRow, Row, SourceTable};

/// Message recorded when a row fails the completeness check.
pub const ERR_INCOMPLETE_ROW: &str = "Some fields missing data";

/// Applies the completeness check and an ordered rule list to rows.
#[derive(Debug, Clone)]
pub struct RowValidator {
    expected_fields: Vec<String>,
    required_fields: Vec<String>,
    rules: Vec<ValidationRule>,
}

impl RowValidator {
    pub fn new(
        expected_fields: Vec<String>,
        required_fields: Vec<String>,
        rules: Vec<ValidationRule>,
    ) -> Self {
        Self {
            expected_fields,
            required_fields,
            rules,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(
            config.source_fields.clone(),
            config.required_fields.clone(),
            config.checks.clone(),
        )
    }

    /// Build working rows from the source and annotate them.
    ///
    /// The source table is only read; each call starts from fresh rows, so
    /// validating the same table twice yields identical results.
    pub fn validate(&self, source: &SourceTable) -> Vec<Row> {
        let mut rows: Vec<Row> = source
            .records
            .iter()
            .map(|record| Row::from_source(&self.expected_fields, record))
            .collect();
        self.check_rows(&mut rows);
        rows
    }

    /// Run completeness and every configured rule over `rows`.
    pub fn check_rows(&self, rows: &mut [Row]) {
        info!(task = "completeness", "Running check");
        for row in rows.iter_mut() {
            self.check_completeness(row);
        }

        for rule in &self.rules {
            if rule.is_unconfigured() {
                warn!(task = rule.kind(), "Check has no fields configured, skipped");
                continue;
            }
            info!(task = rule.kind(), "Running check");
            for row in rows.iter_mut().filter(|r| !r.is_incomplete()) {
                apply_rule(rule, row);
            }
        }
    }

    fn check_completeness(&self, row: &mut Row) {
        if row.column_count() != self.expected_fields.len() {
            debug!(
                row = %row.id(),
                columns = row.column_count(),
                expected = self.expected_fields.len(),
                "Record has incomplete data"
            );
            row.mark_incomplete(ERR_INCOMPLETE_ROW);
            return;
        }

        let blank: Vec<&str> = self
            .required_fields
            .iter()
            .filter(|f| row.get(f).map_or(true, |v| !is_non_blank(v)))
            .map(String::as_str)
            .collect();
        if !blank.is_empty() {
            debug!(row = %row.id(), fields = ?blank, "Record has blank required fields");
            row.mark_incomplete(format!("{} ({})", ERR_INCOMPLETE_ROW, blank.join(", ")));
        }
    }
}

fn invalid_message(field: &str, value: Option<&FieldValue>) -> String {
    match value {
        Some(v) => format!("Invalid ({}):{}", field, v),
        None => format!("Invalid ({}):<missing>", field),
    }
}

fn reject(row: &mut Row, field: &str) {
    let message = invalid_message(field, row.get(field));
    debug!(row = %row.id(), field, "{}", message);
    row.reject(message);
}

fn check_each<F>(row: &mut Row, fields: &[String], predicate: F)
where
    F: Fn(&FieldValue) -> bool,
{
    for field in fields {
        let ok = row.get(field).is_some_and(&predicate);
        if !ok {
            reject(row, field);
        }
    }
}

fn apply_rule(rule: &ValidationRule, row: &mut Row) {
    match rule {
        ValidationRule::Membership { fields } => {
            for (field, allowed) in fields {
                let ok = row.get(field).is_some_and(|v| is_member(v, allowed));
                if !ok {
                    reject(row, field);
                }
            }
        }
        ValidationRule::Date { fields, format } => {
            check_each(row, fields, |v| is_valid_date(v, format));
        }
        ValidationRule::NonBlank { fields } => {
            check_each(row, fields, is_non_blank);
        }
        ValidationRule::Numeric { fields } => {
            for field in fields {
                let parsed = row
                    .get(field)
                    .filter(|v| is_numeric(v))
                    .and_then(FieldValue::as_f64);
                match parsed {
                    Some(n) => {
                        row.set(field, FieldValue::Float(n));
                    }
                    None => reject(row, field),
                }
            }
        }
        ValidationRule::Integer { fields } => {
            for field in fields {
                let current = row.get(field).filter(|v| is_integer(v)).cloned();
                match current {
                    Some(FieldValue::Integer(_)) => {}
                    Some(v) => match v.as_text().parse::<i64>() {
                        Ok(n) => {
                            row.set(field, FieldValue::Integer(n));
                        }
                        Err(_) => {
                            let message = format!("Invalid ({}):{} out of range", field, v);
                            debug!(row = %row.id(), field, "{}", message);
                            row.reject(message);
                        }
                    },
                    None => reject(row, field),
                }
            }
        }
    }
}

/// Rows split by validity.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub accepted: Vec<Row>,
    pub rejected: Vec<RejectedRow>,
}

/// Split annotated rows into accepted and rejected sets.
///
/// Rejected entries carry the row's values as originally ingested, taken
/// from `source`, plus the diagnostics gathered during validation.
pub fn partition(rows: Vec<Row>, source: &SourceTable) -> Partition {
    let mut result = Partition::default();

    for row in rows {
        if row.is_valid() {
            result.accepted.push(row);
            continue;
        }

        let values: BTreeMap<String, String> = match source.record(row.id()) {
            Some(record) => source
                .named_values(record)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            None => row
                .values()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        warn!(row = %row.id(), errors = ?row.error_messages(), "Row rejected");
        result.rejected.push(RejectedRow {
            id: row.id(),
            values,
            column_count: row.column_count(),
            error_messages: row.error_messages().to_vec(),
        });
    }

    if !result.rejected.is_empty() {
        warn!("{} row(s) rejected", result.rejected.len());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::collections::BTreeSet;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn table(rows: &[&[&str]]) -> SourceTable {
        let fields = strings(&["Region", "Channel", "Date", "Units", "Price"]);
        SourceTable::new(
            fields.clone(),
            fields,
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn validator() -> RowValidator {
        let fields = strings(&["Region", "Channel", "Date", "Units", "Price"]);
        let allowed: BTreeSet<String> = ["Online", "Offline"].iter().map(|s| s.to_string()).collect();
        RowValidator::new(
            fields.clone(),
            fields,
            vec![
                ValidationRule::Membership {
                    fields: IndexMap::from([("Channel".to_string(), allowed)]),
                },
                ValidationRule::Date {
                    fields: strings(&["Date"]),
                    format: "%m/%d/%Y".into(),
                },
                ValidationRule::Integer {
                    fields: strings(&["Units"]),
                },
                ValidationRule::Numeric {
                    fields: strings(&["Price"]),
                },
            ],
        )
    }

    #[test]
    fn test_valid_row_is_coerced() {
        let source = table(&[&["Asia", "Online", "4/10/2010", "3322", "205.7"]]);
        let rows = validator().validate(&source);
        assert!(rows[0].is_valid());
        assert_eq!(rows[0].get("Units"), Some(&FieldValue::Integer(3322)));
        assert_eq!(rows[0].get("Price"), Some(&FieldValue::Float(205.7)));
        assert_eq!(rows[0].get("Region"), Some(&FieldValue::from("Asia")));
        // Source stays untouched.
        assert_eq!(source.records[0].values[3], "3322");
    }

    #[test]
    fn test_errors_accumulate_in_rule_order() {
        let source = table(&[&["Asia", "Web", "14/10/2010", "12.5", "abc"]]);
        let rows = validator().validate(&source);
        assert!(!rows[0].is_valid());
        assert_eq!(
            rows[0].error_messages(),
            [
                "Invalid (Channel):Web",
                "Invalid (Date):14/10/2010",
                "Invalid (Units):12.5",
                "Invalid (Price):abc",
            ]
        );
    }

    #[test]
    fn test_membership_errors_follow_declared_order() {
        let set = |values: &[&str]| values.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        let fields = strings(&["Region", "Channel", "Date", "Units", "Price"]);
        let validator = RowValidator::new(
            fields.clone(),
            fields,
            vec![ValidationRule::Membership {
                fields: IndexMap::from([
                    ("Region".to_string(), set(&["Asia", "Europe"])),
                    ("Channel".to_string(), set(&["Online", "Offline"])),
                ]),
            }],
        );
        let source = table(&[&["Mars", "Web", "4/10/2010", "1", "2"]]);
        let rows = validator.validate(&source);
        assert_eq!(
            rows[0].error_messages(),
            ["Invalid (Region):Mars", "Invalid (Channel):Web"]
        );
    }

    #[test]
    fn test_incomplete_row_skips_field_checks() {
        let source = table(&[&["Asia", "Web", "bad"]]);
        let rows = validator().validate(&source);
        assert!(rows[0].is_incomplete());
        assert_eq!(rows[0].error_messages(), [ERR_INCOMPLETE_ROW]);
    }

    #[test]
    fn test_blank_required_field_is_incomplete() {
        let source = table(&[&["", "Web", "4/10/2010", "1", "2"]]);
        let rows = validator().validate(&source);
        assert!(rows[0].is_incomplete());
        assert_eq!(rows[0].error_messages(), ["Some fields missing data (Region)"]);
    }

    #[test]
    fn test_rejection_is_monotonic() {
        // Invalid channel first, every later check passes: row stays rejected.
        let source = table(&[&["Asia", "Web", "4/10/2010", "1", "2"]]);
        let rows = validator().validate(&source);
        assert!(!rows[0].is_valid());
        assert_eq!(rows[0].error_messages().len(), 1);
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let source = table(&[&["Asia", "Online", "4/10/2010", "1", "inf"]]);
        let rows = validator().validate(&source);
        assert!(!rows[0].is_valid());
        assert_eq!(rows[0].error_messages(), ["Invalid (Price):inf"]);
    }

    #[test]
    fn test_integer_overflow_rejected() {
        let source = table(&[&["Asia", "Online", "4/10/2010", "99999999999999999999", "2"]]);
        let rows = validator().validate(&source);
        assert!(!rows[0].is_valid());
        assert!(rows[0].error_messages()[0].ends_with("out of range"));
    }

    #[test]
    fn test_unconfigured_rule_skipped() {
        let fields = strings(&["a"]);
        let validator = RowValidator::new(
            fields.clone(),
            fields.clone(),
            vec![ValidationRule::Numeric { fields: vec![] }],
        );
        let source = SourceTable::new(fields.clone(), fields, vec![strings(&["x"])]);
        let rows = validator.validate(&source);
        assert!(rows[0].is_valid());
    }

    #[test]
    fn test_partition_counts_and_original_values() {
        let source = table(&[
            &["Asia", "Online", "4/10/2010", "3322", "205.7"],
            &["Asia", "Web", "4/10/2010", "10", "1.5"],
            &["Europe", "Offline"],
        ]);
        let rows = validator().validate(&source);
        let part = partition(rows, &source);

        assert_eq!(part.accepted.len() + part.rejected.len(), source.len());
        assert_eq!(part.accepted.len(), 1);
        assert_eq!(part.rejected.len(), 2);

        let web = &part.rejected[0];
        assert_eq!(web.id.0, 2);
        assert_eq!(web.values["Units"], "10");
        assert_eq!(web.column_count, 5);

        let short = &part.rejected[1];
        assert_eq!(short.column_count, 2);
        assert_eq!(short.values.len(), 2);
        assert_eq!(short.error_messages, [ERR_INCOMPLETE_ROW]);
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let source = table(&[
            &["Asia", "Online", "4/10/2010", "3322", "205.7"],
            &["Asia", "Web", "4/10/2010", "10", "1.5"],
            &["", "Offline", "4/10/2010", "10", "1.5"],
        ]);
        let v = validator();
        let first = v.validate(&source);
        let second = v.validate(&source);
        assert_eq!(first, second);

        let ids = |p: &Partition| p.accepted.iter().map(|r| r.id()).collect::<Vec<_>>();
        assert_eq!(ids(&partition(first, &source)), ids(&partition(second, &source)));
    }

    #[test]
    fn test_checks_on_coerced_rows_are_stable() {
        let source = table(&[&["Asia", "Online", "4/10/2010", "3322", "205.7"]]);
        let v = validator();
        let mut rows = v.validate(&source);
        v.check_rows(&mut rows);
        assert!(rows[0].is_valid());
        assert_eq!(rows[0].get("Units"), Some(&FieldValue::Integer(3322)));
    }
}
