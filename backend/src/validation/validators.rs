//! Single-value predicates used by the validation checks.
//!
//! All functions are pure and accept either raw text or an already-coerced
//! number through [`FieldValue`].

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

use crate::models::FieldValue;

/// True if the value is a finite floating-point or integer literal.
///
/// `inf` and `NaN` parse as floats but have no JSON form, so they fail.
pub fn is_numeric(value: &FieldValue) -> bool {
    match value {
        FieldValue::Integer(_) => true,
        FieldValue::Float(f) => f.is_finite(),
        FieldValue::Text(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
    }
}

/// True if the value parses exactly under `format` (a `strftime`-style pattern).
///
/// Impossible calendar dates such as `02/30/2021` are rejected.
pub fn is_valid_date(value: &FieldValue, format: &str) -> bool {
    let text = value.as_text();
    NaiveDate::parse_from_str(&text, format).is_ok()
        || NaiveDateTime::parse_from_str(&text, format).is_ok()
}

/// True if the value is a non-empty run of ASCII digits.
///
/// No sign and no decimal point: `-1` and `1.0` are not integers here.
pub fn is_integer(value: &FieldValue) -> bool {
    match value {
        FieldValue::Integer(n) => *n >= 0,
        FieldValue::Float(_) => false,
        FieldValue::Text(s) => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// True if the value has non-whitespace content.
pub fn is_non_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// True if the value is exactly one of `allowed` (case-sensitive).
pub fn is_member(value: &FieldValue, allowed: &BTreeSet<String>) -> bool {
    allowed.contains(value.as_text().as_ref())
}
