//! Domain models for the rowfold pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`FieldValue`] - A cell value, raw text or a coerced number
//! - [`SourceTable`] / [`SourceRecord`] - Immutable ingested records
//! - [`Row`] - The mutable working copy annotated by validation
//! - [`RejectedRow`] / [`RejectedBatch`] - Rejected rows with diagnostics
//!
//! Ingested records and working rows live in separate containers: the
//! validation engine builds [`Row`]s from a borrowed [`SourceTable`] and never
//! writes back to it.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Field Values
// =============================================================================

/// A single cell value.
///
/// Every value starts as [`FieldValue::Text`]. Numeric and integer checks
/// replace the text with the parsed number once it is known to be valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Text form of the value, as it would appear in the source.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Integer(n) => Cow::Owned(n.to_string()),
            FieldValue::Float(f) => Cow::Owned(f.to_string()),
        }
    }

    /// Numeric view of the value, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

// =============================================================================
// Ingested Records
// =============================================================================

/// 1-based sequence number assigned in ingestion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One data record exactly as read, values by position.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: RowId,
    pub values: Vec<String>,
}

/// All ingested records plus the field list they are read against.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    /// Configured source fields, in order.
    pub fields: Vec<String>,
    /// Header row as found in the source (discarded for processing).
    pub headers: Vec<String>,
    /// Data records in ingestion order.
    pub records: Vec<SourceRecord>,
}

impl SourceTable {
    /// Build a table from positional rows, numbering them from 1.
    pub fn new(fields: Vec<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| SourceRecord {
                id: RowId(i + 1),
                values,
            })
            .collect();
        Self {
            fields,
            headers,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its id.
    pub fn record(&self, id: RowId) -> Option<&SourceRecord> {
        self.records
            .get(id.0.wrapping_sub(1))
            .filter(|r| r.id == id)
            .or_else(|| self.records.iter().find(|r| r.id == id))
    }

    /// Field name → value pairs of a record, truncated to the shorter side.
    pub fn named_values<'a>(
        &'a self,
        record: &'a SourceRecord,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields
            .iter()
            .zip(record.values.iter())
            .map(|(f, v)| (f.as_str(), v.as_str()))
    }
}

// =============================================================================
// Working Rows
// =============================================================================

/// Working copy of a record, annotated by the validation engine.
///
/// `is_valid` can only go from `true` to `false`: the only mutators are
/// [`Row::reject`] and [`Row::mark_incomplete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    values: Vec<(String, FieldValue)>,
    column_count: usize,
    is_valid: bool,
    incomplete: bool,
    error_messages: Vec<String>,
}

impl Row {
    /// Create a fresh, valid row from a source record.
    pub fn from_source(fields: &[String], record: &SourceRecord) -> Self {
        let values = fields
            .iter()
            .zip(record.values.iter())
            .map(|(f, v)| (f.clone(), FieldValue::Text(v.clone())))
            .collect();
        Self {
            id: record.id,
            values,
            column_count: record.values.len(),
            is_valid: true,
            incomplete: false,
            error_messages: Vec::new(),
        }
    }

    /// Create a row directly from named values (column count = value count).
    pub fn new(id: RowId, values: Vec<(String, FieldValue)>) -> Self {
        let column_count = values.len();
        Self {
            id,
            values,
            column_count,
            is_valid: true,
            incomplete: false,
            error_messages: Vec::new(),
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Whether the completeness check failed for this row.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// Replace the value of an existing field. Returns `false` if the field is absent.
    pub fn set(&mut self, field: &str, value: FieldValue) -> bool {
        match self.values.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Field name → value pairs in source order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Record a failed check.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.error_messages.push(message.into());
    }

    /// Record a failed completeness check; later field checks skip this row.
    pub fn mark_incomplete(&mut self, message: impl Into<String>) {
        self.incomplete = true;
        self.reject(message);
    }
}

// =============================================================================
// Rejected Rows
// =============================================================================

/// A rejected row: original values plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRow {
    pub id: RowId,
    /// Field values exactly as ingested.
    pub values: BTreeMap<String, String>,
    pub column_count: usize,
    pub error_messages: Vec<String>,
}

/// Rejected rows keyed by row id, the payload handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejectedBatch(pub BTreeMap<RowId, RejectedRow>);

impl RejectedBatch {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RejectedRow> {
        self.0.values()
    }
}

impl From<Vec<RejectedRow>> for RejectedBatch {
    fn from(rows: Vec<RejectedRow>) -> Self {
        Self(rows.into_iter().map(|r| (r.id, r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_source_table_numbers_rows_from_one() {
        let table = SourceTable::new(
            fields(&["a", "b"]),
            fields(&["a", "b"]),
            vec![fields(&["1", "2"]), fields(&["3", "4"])],
        );
        assert_eq!(table.records[0].id, RowId(1));
        assert_eq!(table.records[1].id, RowId(2));
        assert_eq!(table.record(RowId(2)).unwrap().values, fields(&["3", "4"]));
        assert!(table.record(RowId(3)).is_none());
    }

    #[test]
    fn test_row_from_short_record() {
        let record = SourceRecord {
            id: RowId(1),
            values: fields(&["x"]),
        };
        let row = Row::from_source(&fields(&["a", "b"]), &record);
        assert_eq!(row.column_count(), 1);
        assert_eq!(row.get("a"), Some(&FieldValue::from("x")));
        assert!(row.get("b").is_none());
        assert!(row.is_valid());
    }

    #[test]
    fn test_reject_is_monotonic() {
        let mut row = Row::new(RowId(1), vec![("a".into(), "1".into())]);
        row.reject("first");
        row.reject("second");
        assert!(!row.is_valid());
        assert!(!row.is_incomplete());
        assert_eq!(row.error_messages(), ["first", "second"]);

        row.mark_incomplete("missing");
        assert!(row.is_incomplete());
        assert!(!row.is_valid());
    }

    #[test]
    fn test_set_only_existing_fields() {
        let mut row = Row::new(RowId(1), vec![("a".into(), "1".into())]);
        assert!(row.set("a", FieldValue::Integer(1)));
        assert!(!row.set("z", FieldValue::Integer(2)));
        assert_eq!(row.get("a"), Some(&FieldValue::Integer(1)));
    }

    #[test]
    fn test_field_value_serialization() {
        let values = vec![
            FieldValue::Integer(8446),
            FieldValue::Float(437.2),
            FieldValue::Text("Libya".into()),
        ];
        assert_eq!(serde_json::to_value(&values).unwrap(), json!([8446, 437.2, "Libya"]));
        assert_eq!(FieldValue::Float(437.2).as_text(), "437.2");
        assert_eq!(FieldValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(FieldValue::from("abc").as_f64(), None);
    }

    #[test]
    fn test_rejected_batch_keys_by_id() {
        let batch = RejectedBatch::from(vec![RejectedRow {
            id: RowId(4),
            values: BTreeMap::from([("Region".to_string(), "Asia".to_string())]),
            column_count: 1,
            error_messages: vec!["Some fields missing data".into()],
        }]);
        let doc = serde_json::to_value(&batch).unwrap();
        assert_eq!(doc["4"]["values"]["Region"], "Asia");
        assert_eq!(doc["4"]["columnCount"], 1);
        assert_eq!(doc["4"]["errorMessages"][0], "Some fields missing data");
    }
}
