//! Row and cell types handed over by a row source

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::mapping::{DetailColumnMapping, FieldMapping};

/// A single cell as read from the row source, before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// Blank cells are omitted from payloads entirely
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Best-effort string form, used for display values and string coercion
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }
}

/// One unit of import work: a ledger key plus raw values keyed by source
/// column header.
#[derive(Debug, Clone)]
pub struct Row {
    /// Explicit identifier column value, or the 1-based row position when
    /// no identifier column is configured. Positional ids lose resumability
    /// if the sheet order changes between runs.
    pub row_id: String,
    pub fields: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.fields.insert(column.into(), value);
        self
    }
}

/// Everything the driver needs from a row source
#[derive(Debug, Clone, Default)]
pub struct ImportInput {
    /// Parent rows, in sheet order
    pub rows: Vec<Row>,
    pub mappings: Vec<FieldMapping>,
    pub detail_mappings: Vec<DetailColumnMapping>,
    /// Header of the column whose values became row ids, when one was found
    pub id_column: Option<String>,
    /// Child rows grouped by parent row id
    pub detail_rows: HashMap<String, Vec<Row>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text("x".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_number_to_text_drops_trailing_zero() {
        assert_eq!(CellValue::Number(42.0).to_text(), "42");
        assert_eq!(CellValue::Number(4.25).to_text(), "4.25");
        assert_eq!(CellValue::Number(-3.0).to_text(), "-3");
    }
}
