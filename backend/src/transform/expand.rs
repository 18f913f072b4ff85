//! Code expansion: replace short codes with their configured long form.
//!
//! Expansion runs on accepted rows only. A value with no entry in the
//! lookup table is left as it is.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{FieldValue, Row};

/// Field name → (code → replacement).
pub type ExpansionTable = BTreeMap<String, BTreeMap<String, String>>;

/// Apply every lookup to every row. Returns the number of replaced values.
pub fn expand_fields(rows: &mut [Row], lookups: &ExpansionTable) -> usize {
    let mut replaced = 0;

    for (field, table) in lookups {
        for row in rows.iter_mut() {
            let replacement = row
                .get(field)
                .and_then(|value| table.get(value.as_text().as_ref()))
                .cloned();
            if let Some(long) = replacement {
                if row.set(field, FieldValue::Text(long)) {
                    replaced += 1;
                }
            }
        }
        debug!(field = %field, "Expanded field codes");
    }

    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowId;

    fn priority_row(id: usize, code: &str) -> Row {
        Row::new(
            RowId(id),
            vec![
                ("Country".to_string(), "Libya".into()),
                ("Order Priority".to_string(), code.into()),
            ],
        )
    }

    fn lookups() -> ExpansionTable {
        BTreeMap::from([(
            "Order Priority".to_string(),
            BTreeMap::from([
                ("H".to_string(), "High".to_string()),
                ("C".to_string(), "Critical".to_string()),
                ("M".to_string(), "Medium".to_string()),
                ("L".to_string(), "Low".to_string()),
            ]),
        )])
    }

    #[test]
    fn test_known_codes_replaced() {
        let mut rows = vec![priority_row(1, "H"), priority_row(2, "C")];
        let count = expand_fields(&mut rows, &lookups());
        assert_eq!(count, 2);
        assert_eq!(rows[0].get("Order Priority"), Some(&FieldValue::from("High")));
        assert_eq!(rows[1].get("Order Priority"), Some(&FieldValue::from("Critical")));
        assert_eq!(rows[0].get("Country"), Some(&FieldValue::from("Libya")));
    }

    #[test]
    fn test_unknown_code_left_unchanged() {
        let mut rows = vec![priority_row(1, "X")];
        assert_eq!(expand_fields(&mut rows, &lookups()), 0);
        assert_eq!(rows[0].get("Order Priority"), Some(&FieldValue::from("X")));
    }

    #[test]
    fn test_numeric_value_matched_by_text() {
        let mut rows = vec![Row::new(
            RowId(1),
            vec![("Code".to_string(), FieldValue::Integer(7))],
        )];
        let table = BTreeMap::from([(
            "Code".to_string(),
            BTreeMap::from([("7".to_string(), "Seven".to_string())]),
        )]);
        expand_fields(&mut rows, &table);
        assert_eq!(rows[0].get("Code"), Some(&FieldValue::from("Seven")));
    }
}
