//! Progress reporting and cooperative cancellation
//!
//! The driver owns no UI; it calls an injected observer synchronously
//! after every row and polls the same observer for cancellation at fixed
//! points in the row loop.

/// Running counters for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportTotals {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Terminal state of one visited row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Succeeded,
    Failed,
    Skipped,
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RowOutcome::Succeeded => "imported",
            RowOutcome::Failed => "failed",
            RowOutcome::Skipped => "skipped",
        }
    }
}

/// Injected observer for per-row progress and cancellation
pub trait ProgressObserver {
    /// Called synchronously after every processed row
    fn on_progress(
        &self,
        processed: usize,
        total_rows: usize,
        row_id: &str,
        outcome: RowOutcome,
        totals: &ImportTotals,
    );

    /// Polled before the skip check, before payload building, mid-way
    /// through building large field lists, and after each API call
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that reports nothing and never cancels
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(
        &self,
        _processed: usize,
        _total_rows: usize,
        _row_id: &str,
        _outcome: RowOutcome,
        _totals: &ImportTotals,
    ) {
    }
}
