//! Field mapping metadata
//!
//! Mappings describe how a source column lands on a remote form field.
//! They are produced by a mapping reader (the Excel source here) and are
//! immutable once loaded.

use log::debug;

/// Explicit per-column flags from the mapping sheet, e.g. "choice, required"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingFlags {
    /// Force Choice classification regardless of other metadata
    pub choice: bool,
    pub required: bool,
    pub read_only: bool,
}

impl MappingFlags {
    /// Parse a comma/space separated flag list; unknown tokens are ignored
    pub fn parse(raw: &str) -> Self {
        let mut flags = MappingFlags::default();
        for token in raw.split([',', ';', ' ']) {
            match token.trim().to_lowercase().as_str() {
                "choice" => flags.choice = true,
                "required" => flags.required = true,
                "readonly" | "read-only" => flags.read_only = true,
                _ => {}
            }
        }
        flags
    }

    pub fn editability(&self) -> i32 {
        if self.read_only { 0 } else { 1 }
    }

    pub fn requiredness(&self) -> i32 {
        if self.required { 1 } else { 0 }
    }
}

/// One mapped parent-form field
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Header of the source column in the data sheet
    pub source_column: String,
    /// Human-readable field label
    pub friendly_name: String,
    /// Remote field database name, also the classification fallback signal
    pub database_name: String,
    /// Remote field GUID
    pub field_guid: String,
    /// Type hint from the remote schema, empty when metadata was absent
    pub column_type_hint: String,
    pub flags: MappingFlags,
}

impl FieldMapping {
    /// A mapping without a target GUID or database name cannot be sent
    pub fn is_complete(&self) -> bool {
        !self.field_guid.trim().is_empty() && !self.database_name.trim().is_empty()
    }
}

/// Analogous mapping for one column of a nested item list
#[derive(Debug, Clone)]
pub struct DetailColumnMapping {
    pub source_column: String,
    pub friendly_name: String,
    pub database_name: String,
    /// Item-list column GUID
    pub column_guid: String,
    pub column_type_hint: String,
    pub flags: MappingFlags,
}

impl DetailColumnMapping {
    pub fn is_complete(&self) -> bool {
        !self.column_guid.trim().is_empty() && !self.database_name.trim().is_empty()
    }
}

/// Drop mappings missing their GUID or database name. Incomplete rows in
/// the mapping sheet are excluded silently, not treated as errors.
pub fn retain_complete(mappings: Vec<FieldMapping>) -> Vec<FieldMapping> {
    mappings
        .into_iter()
        .filter(|m| {
            if !m.is_complete() {
                debug!(
                    "Dropping incomplete mapping for column '{}' (guid or database name missing)",
                    m.source_column
                );
                return false;
            }
            true
        })
        .collect()
}

/// Same filtering for item-list column mappings
pub fn retain_complete_details(mappings: Vec<DetailColumnMapping>) -> Vec<DetailColumnMapping> {
    mappings
        .into_iter()
        .filter(|m| {
            if !m.is_complete() {
                debug!(
                    "Dropping incomplete detail mapping for column '{}'",
                    m.source_column
                );
                return false;
            }
            true
        })
        .collect()
}
