//! Raw cell coercion into wire representations
//!
//! Coercion never fails: malformed input lands on a type-appropriate zero
//! value or passes through as text, and the display string keeps the
//! best-effort original content. Only genuinely fatal conditions are
//! errors, and none of those live here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};

use super::classify::FieldKind;
use super::row::CellValue;

/// Wire value plus display string for one coerced cell
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Value,
    pub display: String,
}

impl Coerced {
    fn new(value: Value, display: impl Into<String>) -> Self {
        Self {
            value,
            display: display.into(),
        }
    }
}

/// Strip NUL bytes and control characters other than tab/CR/LF
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'))
        .collect()
}

/// Convert a raw cell into the wire shape required by its classified type
pub fn coerce(raw: &CellValue, kind: FieldKind) -> Coerced {
    let text = sanitize(&raw.to_text());

    match kind {
        FieldKind::String | FieldKind::LongText => Coerced::new(json!(text.clone()), text),

        // The remote contract requires no string echo for booleans
        FieldKind::Boolean => Coerced::new(json!(parse_bool(raw, &text)), ""),

        FieldKind::DateTime => match parse_datetime(raw, &text) {
            Some(utc) => {
                let iso = utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
                Coerced::new(json!(iso.clone()), iso)
            }
            // Unparseable timestamps pass through untouched
            None => Coerced::new(json!(text.clone()), text),
        },

        FieldKind::Integer => {
            let n = parse_integer(raw, &text);
            Coerced::new(json!(n), n.to_string())
        }

        FieldKind::Decimal => {
            let n = parse_decimal(raw, &text);
            Coerced::new(json!(n), n.to_string())
        }

        FieldKind::Choice => Coerced::new(choice_value(&text), text),
    }
}

fn parse_bool(raw: &CellValue, text: &str) -> bool {
    match raw {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n != 0.0,
        _ => match text.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => true,
            "false" | "0" | "no" | "n" => false,
            other => other.parse::<f64>().map(|n| n != 0.0).unwrap_or(false),
        },
    }
}

fn parse_datetime(raw: &CellValue, text: &str) -> Option<DateTime<Utc>> {
    if let CellValue::DateTime(dt) = raw {
        return Some(*dt);
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

fn parse_integer(raw: &CellValue, text: &str) -> i64 {
    match raw {
        CellValue::Number(n) => *n as i64,
        CellValue::Bool(b) => *b as i64,
        _ => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|n| n as i64))
                .unwrap_or(0)
        }
    }
}

fn parse_decimal(raw: &CellValue, text: &str) -> f64 {
    let n = match raw {
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => (*b as i64) as f64,
        _ => text.trim().parse::<f64>().unwrap_or(0.0),
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Choice cells are either "id#name" or a bare name. The wire shape is a
/// single-element list; the id key is present only when non-empty.
fn choice_value(text: &str) -> Value {
    match text.split_once('#') {
        Some((id, name)) => {
            let id = id.trim();
            let name = name.trim();
            if id.is_empty() {
                json!([{ "name": name }])
            } else {
                json!([{ "id": id, "name": name }])
            }
        }
        None => json!([{ "name": text.trim() }]),
    }
}
