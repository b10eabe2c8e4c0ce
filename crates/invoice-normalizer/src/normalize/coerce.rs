//! Cell coercion into canonical field types.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::record::CanonicalValue;
use crate::input::{CellValue, excel_serial_to_datetime};
use crate::schema::FieldType;

/// Currency symbols and codes stripped before numeric parsing.
static CURRENCY_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)US\$|USD|EUR|GBP|[$€£¥₹]").unwrap());

/// Outcome of coercing one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// Blank or null-token cell.
    Empty,
    /// Successfully coerced value.
    Value(CanonicalValue),
    /// The cell could not be read as the declared type; carries the raw text.
    Invalid(String),
}

/// Coerce `cell` into `field_type`, trying `date_formats` in order for text
/// dates.
pub fn coerce(cell: &CellValue, field_type: FieldType, date_formats: &[String]) -> Coerced {
    if cell.is_empty() {
        return Coerced::Empty;
    }

    let result = match field_type {
        FieldType::String => Some(CanonicalValue::Text(coerce_string(cell))),
        FieldType::Number => coerce_number(cell).map(CanonicalValue::Number),
        FieldType::Currency => coerce_number(cell)
            .map(round_cents)
            .filter(|n| n.is_finite())
            .map(CanonicalValue::Currency),
        FieldType::Date => coerce_date(cell, date_formats).map(CanonicalValue::Date),
    };

    match result {
        Some(value) => Coerced::Value(value),
        None => Coerced::Invalid(cell.to_string()),
    }
}

/// Render any cell as normalized text.
pub fn coerce_string(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => collapse_whitespace(s),
        CellValue::Number(n) => n.to_string(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Read a numeric or currency cell.
pub fn coerce_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_amount(s),
        _ => None,
    }
}

/// Read a date cell.
pub fn coerce_date(cell: &CellValue, formats: &[String]) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
        CellValue::Text(s) => parse_date(s, formats),
        _ => None,
    }
}

/// Parse an amount such as `"$1,234.50"`, `"USD 99"` or `"(12.00)"`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let mut s: String = CURRENCY_MARKERS
        .replace_all(text.trim(), "")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let negative = s.starts_with('(') && s.ends_with(')') && s.len() >= 2;
    if negative {
        s = s[1..s.len() - 1].to_string();
    }
    if s.is_empty() {
        return None;
    }

    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Parse a text date with the first matching format.
pub fn parse_date(text: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = collapse_whitespace(text);
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&s, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(&s, fmt).ok().map(|dt| dt.date()))
    })
}

/// Round to whole cents, avoiding a negative zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
