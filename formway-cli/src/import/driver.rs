//! Row import orchestration
//!
//! Rows are processed strictly sequentially, one API call outstanding at a
//! time. Per-row failures are recorded and never stop the run; only
//! configuration, authentication and ledger-write failures are fatal.

use anyhow::{Context, Result};
use log::{debug, error, info};

use crate::api::client::ElementApi;
use crate::import::ledger::{Ledger, RowStatus};
use crate::import::payload::PayloadBuilder;
use crate::import::progress::{ImportTotals, ProgressObserver, RowOutcome};
use crate::import::row::ImportInput;

/// One failed row, kept for the end-of-run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row_id: String,
    pub message: String,
}

/// Aggregate result of one run
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub totals: ImportTotals,
    pub errors: Vec<RowError>,
    /// Whether the run stopped early on a cancellation request
    pub cancelled: bool,
}

/// Drives one import run against a ledger and an element API
pub struct ImportDriver<'a> {
    api: &'a dyn ElementApi,
    ledger: &'a Ledger,
    builder: PayloadBuilder,
}

impl<'a> ImportDriver<'a> {
    pub fn new(api: &'a dyn ElementApi, ledger: &'a Ledger, builder: PayloadBuilder) -> Self {
        Self {
            api,
            ledger,
            builder,
        }
    }

    /// Process every row not already marked Success in the ledger.
    ///
    /// Cancellation is polled at fixed points; once observed, the loop
    /// stops without writing any outcome for the row in flight, so the
    /// ledger never sees a partial row.
    pub async fn run(
        &self,
        input: &ImportInput,
        observer: &dyn ProgressObserver,
    ) -> Result<ImportOutcome> {
        let imported = self.ledger.load();
        self.ledger
            .write_start()
            .context("Failed to open the status ledger")?;

        let total = input.rows.len();
        info!(
            "Importing {} rows ({} already recorded in the ledger)",
            total,
            imported.len()
        );

        let mut outcome = ImportOutcome::default();

        for row in &input.rows {
            if observer.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let already_imported = imported
                .get(row.row_id.as_str())
                .map(|entry| entry.is_imported())
                .unwrap_or(false);
            if already_imported {
                debug!("Row {}: already imported, skipping", row.row_id);
                outcome.totals.skipped += 1;
                outcome.totals.processed += 1;
                observer.on_progress(
                    outcome.totals.processed,
                    total,
                    &row.row_id,
                    RowOutcome::Skipped,
                    &outcome.totals,
                );
                continue;
            }

            if observer.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let Some(request) = self.builder.build_request(row, input, observer) else {
                // Cancellation observed while assembling the field list
                outcome.cancelled = true;
                break;
            };

            let result = self.api.create_element(&request).await;

            if observer.is_cancelled() {
                // Stopped mid-flight: deliberately no ledger write for this
                // row, the next run re-submits it
                outcome.cancelled = true;
                break;
            }

            match result {
                Ok(_) => {
                    self.ledger
                        .update(&row.row_id, RowStatus::Success, None)
                        .with_context(|| {
                            format!("Failed to record success for row {}", row.row_id)
                        })?;
                    debug!("Row {}: imported", row.row_id);
                    outcome.totals.succeeded += 1;
                    outcome.totals.processed += 1;
                    observer.on_progress(
                        outcome.totals.processed,
                        total,
                        &row.row_id,
                        RowOutcome::Succeeded,
                        &outcome.totals,
                    );
                }
                Err(err) => {
                    let message = err.to_string();
                    error!("Row {}: {}", row.row_id, message);
                    self.ledger
                        .update(&row.row_id, RowStatus::Error, Some(&message))
                        .with_context(|| {
                            format!("Failed to record failure for row {}", row.row_id)
                        })?;
                    outcome.errors.push(RowError {
                        row_id: row.row_id.clone(),
                        message,
                    });
                    outcome.totals.failed += 1;
                    outcome.totals.processed += 1;
                    observer.on_progress(
                        outcome.totals.processed,
                        total,
                        &row.row_id,
                        RowOutcome::Failed,
                        &outcome.totals,
                    );
                }
            }
        }

        self.ledger
            .write_end()
            .context("Failed to close the status ledger")?;
        Ok(outcome)
    }
}
