//! Durable per-row status ledger
//!
//! A flat CSV store with columns `ID, Status, ImportedDate, ErrorMessage`,
//! one row per imported row id plus `__START__`/`__END__` sentinel rows
//! marking run open/close. Every mutation is a read-modify-write of the
//! whole file; the store must not be shared between concurrent runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::warn;

pub const START_SENTINEL: &str = "__START__";
pub const END_SENTINEL: &str = "__END__";

/// Status column value for sentinel rows
const METADATA_STATUS: &str = "Metadata";

const HEADERS: [&str; 4] = ["ID", "Status", "ImportedDate", "ErrorMessage"];

/// Terminal outcome recorded for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    NotStarted,
    Success,
    Error,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::NotStarted => "NotStarted",
            RowStatus::Success => "Success",
            RowStatus::Error => "Error",
        }
    }

    /// Unknown status text reads as NotStarted so the row gets reprocessed
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Success" => RowStatus::Success,
            "Error" => RowStatus::Error,
            _ => RowStatus::NotStarted,
        }
    }
}

/// One data row of the ledger
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub row_id: String,
    pub status: RowStatus,
    pub imported_at: String,
    pub error_message: String,
}

impl LedgerEntry {
    /// Rows already marked Success are skipped on resume
    pub fn is_imported(&self) -> bool {
        self.status == RowStatus::Success
    }
}

/// Raw file record, sentinels included
#[derive(Debug, Clone)]
struct RawRecord {
    id: String,
    status: String,
    imported_at: String,
    error_message: String,
}

impl RawRecord {
    fn is_sentinel(&self) -> bool {
        self.id == START_SENTINEL || self.id == END_SENTINEL
    }
}

/// Aggregate view of a ledger file, for the status command
#[derive(Debug, Clone, Default)]
pub struct LedgerSummary {
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_started: usize,
    /// Row id / message pairs for rows in Error state, in file order
    pub errors: Vec<(String, String)>,
}

/// Handle to one ledger file
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load per-row statuses. A missing file is an empty ledger; an
    /// unreadable one is logged and treated as empty, trading duplicate
    /// remote submissions for the ability to keep running.
    pub fn load(&self) -> HashMap<String, LedgerEntry> {
        let records = match self.read_records() {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "Could not read ledger {}: {:#}; starting from an empty ledger",
                    self.path.display(),
                    err
                );
                return HashMap::new();
            }
        };

        let mut entries = HashMap::new();
        for record in records {
            if record.is_sentinel() {
                continue;
            }
            // Last write wins on duplicate ids
            entries.insert(
                record.id.clone(),
                LedgerEntry {
                    row_id: record.id,
                    status: RowStatus::parse(&record.status),
                    imported_at: record.imported_at,
                    error_message: record.error_message,
                },
            );
        }
        entries
    }

    /// Record one row's outcome, preserving the order of existing rows and
    /// appending new ids at the end (before the `__END__` sentinel if one
    /// is present).
    pub fn update(
        &self,
        row_id: &str,
        status: RowStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut records = self.read_records_or_empty();
        let record = RawRecord {
            id: row_id.to_string(),
            status: status.as_str().to_string(),
            imported_at: timestamp(),
            error_message: error_message.unwrap_or("").to_string(),
        };

        if let Some(existing) = records.iter_mut().find(|r| r.id == row_id) {
            *existing = record;
        } else if records.last().is_some_and(|r| r.id == END_SENTINEL) {
            records.insert(records.len() - 1, record);
        } else {
            records.push(record);
        }

        self.write_records(&records)
    }

    /// Upsert the run-start sentinel as the first row
    pub fn write_start(&self) -> Result<()> {
        let mut records = self.read_records_or_empty();
        let sentinel = sentinel_record(START_SENTINEL);
        if let Some(existing) = records.iter_mut().find(|r| r.id == START_SENTINEL) {
            *existing = sentinel;
        } else {
            records.insert(0, sentinel);
        }
        self.write_records(&records)
    }

    /// Upsert the run-end sentinel as the last row
    pub fn write_end(&self) -> Result<()> {
        let mut records = self.read_records_or_empty();
        records.retain(|r| r.id != END_SENTINEL);
        records.push(sentinel_record(END_SENTINEL));
        self.write_records(&records)
    }

    /// Summarize the file for display
    pub fn summary(&self) -> Result<LedgerSummary> {
        let records = self.read_records()?;
        let mut summary = LedgerSummary::default();

        for record in records {
            if record.id == START_SENTINEL {
                summary.started_at = Some(record.imported_at);
                continue;
            }
            if record.id == END_SENTINEL {
                summary.ended_at = Some(record.imported_at);
                continue;
            }
            summary.total += 1;
            match RowStatus::parse(&record.status) {
                RowStatus::Success => summary.succeeded += 1,
                RowStatus::Error => {
                    summary.failed += 1;
                    summary.errors.push((record.id, record.error_message));
                }
                RowStatus::NotStarted => summary.not_started += 1,
            }
        }
        Ok(summary)
    }

    fn read_records_or_empty(&self) -> Vec<RawRecord> {
        match self.read_records() {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "Could not read ledger {}: {:#}; rewriting it from scratch",
                    self.path.display(),
                    err
                );
                Vec::new()
            }
        }
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open ledger: {}", self.path.display()))?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record =
                result.with_context(|| format!("Corrupt ledger row in {}", self.path.display()))?;
            let id = record.get(0).unwrap_or("").to_string();
            if id.is_empty() {
                continue;
            }
            records.push(RawRecord {
                id,
                status: record.get(1).unwrap_or("").to_string(),
                imported_at: record.get(2).unwrap_or("").to_string(),
                error_message: record.get(3).unwrap_or("").to_string(),
            });
        }
        Ok(records)
    }

    fn write_records(&self, records: &[RawRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create ledger directory: {}", parent.display())
                })?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to write ledger: {}", self.path.display()))?;
        writer
            .write_record(HEADERS)
            .context("Failed to write ledger header")?;
        for record in records {
            writer
                .write_record([
                    record.id.as_str(),
                    record.status.as_str(),
                    record.imported_at.as_str(),
                    record.error_message.as_str(),
                ])
                .with_context(|| format!("Failed to write ledger row {}", record.id))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush ledger: {}", self.path.display()))?;
        Ok(())
    }
}

fn sentinel_record(id: &str) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        status: METADATA_STATUS.to_string(),
        imported_at: timestamp(),
        error_message: String::new(),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ledger_in(dir: &tempfile::TempDir) -> Ledger {
        Ledger::new(dir.path().join("import.status.csv"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let ledger = ledger_in(&dir);
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_entries_and_order() {
        let dir = tempdir().unwrap();
        let ledger = ledger_in(&dir);

        ledger.write_start().unwrap();
        ledger.update("row-1", RowStatus::Success, None).unwrap();
        ledger.update("row-2", RowStatus::Error, Some("HTTP 404: gone")).unwrap();
        ledger.update("row-3", RowStatus::Success, None).unwrap();
        ledger.write_end().unwrap();

        let entries = ledger.load();
        assert_eq!(entries.len(), 3);
        assert!(entries["row-1"].is_imported());
        assert!(!entries["row-2"].is_imported());
        assert_eq!(entries["row-2"].error_message, "HTTP 404: gone");
        assert!(entries["row-3"].is_imported());

        // Sentinels stay first and last on the wire format
        let content = std::fs::read_to_string(ledger.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "ID,Status,ImportedDate,ErrorMessage");
        assert!(lines[1].starts_with("__START__,Metadata,"));
        assert!(lines.last().unwrap().starts_with("__END__,Metadata,"));
    }

    #[test]
    fn test_update_rewrites_in_place_and_appends_before_end() {
        let dir = tempdir().unwrap();
        let ledger = ledger_in(&dir);

        ledger.write_start().unwrap();
        ledger.update("row-1", RowStatus::Error, Some("boom")).unwrap();
        ledger.write_end().unwrap();

        // Second run: row-1 flips to Success in place, row-2 appends
        ledger.write_start().unwrap();
        ledger.update("row-1", RowStatus::Success, None).unwrap();
        ledger.update("row-2", RowStatus::Success, None).unwrap();
        ledger.write_end().unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        let ids: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["__START__", "row-1", "row-2", "__END__"]);

        let entries = ledger.load();
        assert!(entries["row-1"].is_imported());
        assert!(entries["row-1"].error_message.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("import.status.csv");
        std::fs::write(&path, b"ID,Status\n\xff\xfe garbage \xff\n").unwrap();

        let ledger = Ledger::new(&path);
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_error_messages_with_commas_round_trip() {
        let dir = tempdir().unwrap();
        let ledger = ledger_in(&dir);

        let message = "HTTP 400: field \"Amount\" invalid, expected a number";
        ledger.update("row-9", RowStatus::Error, Some(message)).unwrap();

        let entries = ledger.load();
        assert_eq!(entries["row-9"].error_message, message);
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempdir().unwrap();
        let ledger = ledger_in(&dir);

        ledger.write_start().unwrap();
        ledger.update("a", RowStatus::Success, None).unwrap();
        ledger.update("b", RowStatus::Error, Some("nope")).unwrap();
        ledger.update("c", RowStatus::Success, None).unwrap();
        ledger.write_end().unwrap();

        let summary = ledger.summary().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, vec![("b".to_string(), "nope".to_string())]);
        assert!(summary.started_at.is_some());
        assert!(summary.ended_at.is_some());
    }
}
