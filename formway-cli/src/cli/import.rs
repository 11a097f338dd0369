//! Import command handler

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use colored::*;
use log::info;

use super::ImportArgs;
use crate::api::{ElementTarget, FormwayClient};
use crate::config::{self, Config};
use crate::excel::{WorkbookOptions, read_workbook};
use crate::import::{
    ImportDriver, ImportOutcome, ImportTarget, ImportTotals, ItemListTarget, Ledger,
    PayloadBuilder, ProgressObserver, RowOutcome, SilentProgress,
};

pub async fn handle_import_command(args: ImportArgs) -> Result<()> {
    let config_path = args
        .config
        .clone()
        .or_else(config::default_config_path)
        .context("No config file given and no user config directory available")?;
    let config = Config::load(&config_path)?;

    let options = WorkbookOptions {
        mapping_sheet: args.mapping_sheet.clone(),
        data_sheet: args.data_sheet.clone().or(config.import.data_sheet.clone()),
        detail_sheet: config.import.detail.as_ref().map(|d| d.sheet.clone()),
        id_column: config.import.id_column.clone(),
        ..WorkbookOptions::default()
    };
    let input = read_workbook(&args.input, &options)
        .with_context(|| format!("Failed to read workbook: {}", args.input.display()))?;

    if input.mappings.is_empty() {
        bail!(
            "No usable field mappings in sheet '{}' of {}",
            args.mapping_sheet,
            args.input.display()
        );
    }
    if input.id_column.is_none() {
        println!(
            "{}",
            "No identifier column configured: rows get positional ids, so reordering the sheet between runs breaks resume."
                .yellow()
        );
    }

    let builder = PayloadBuilder::new(ImportTarget {
        workflow: config.import.workflow.to_string(),
        form_type: config.import.form_type.to_string(),
        business_entity: config.import.business_entity.map(|guid| guid.to_string()),
        item_list: config.import.detail.as_ref().map(|d| ItemListTarget {
            guid: d.list_guid.to_string(),
            name: d.list_name.clone(),
        }),
    });

    if args.dry_run {
        return print_dry_run(&builder, &input);
    }

    let ledger_path = args
        .ledger
        .clone()
        .or(config.import.ledger.clone())
        .unwrap_or_else(|| default_ledger_path(&args.input));
    let ledger = Ledger::new(&ledger_path);
    info!("Using status ledger {}", ledger_path.display());

    let client = FormwayClient::connect(
        config.connection.base_url.clone(),
        ElementTarget {
            database_id: config.connection.database_id.clone(),
            path: config.import.path.clone(),
            mode: config.import.mode.clone(),
        },
        config.retry.policy(),
        &config.connection.client_id,
        config.client_secret()?,
    )
    .await?;

    // Ctrl-C requests a cooperative stop; the driver finishes nothing
    // further once it observes the flag
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancellation requested, stopping after the current row...");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let observer = ConsoleProgress { cancel };
    let driver = ImportDriver::new(&client, &ledger, builder);
    let outcome = match driver.run(&input, &observer).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // Best-effort close marker before surfacing the fatal error
            ledger.write_end().ok();
            return Err(err);
        }
    };

    print_summary(&outcome, &ledger_path);
    Ok(())
}

fn default_ledger_path(input: &std::path::Path) -> PathBuf {
    input.with_extension("status.csv")
}

fn print_dry_run(builder: &PayloadBuilder, input: &crate::import::ImportInput) -> Result<()> {
    for row in &input.rows {
        let request = builder
            .build_request(row, input, &SilentProgress)
            .expect("dry run is never cancelled");
        println!("{}", format!("--- row {} ---", row.row_id).bold());
        println!("{}", serde_json::to_string_pretty(&request)?);
    }
    println!(
        "{}",
        format!("{} rows, no API calls made", input.rows.len()).dimmed()
    );
    Ok(())
}

/// Console observer: one line per row plus the cancellation flag
struct ConsoleProgress {
    cancel: Arc<AtomicBool>,
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(
        &self,
        processed: usize,
        total_rows: usize,
        row_id: &str,
        outcome: RowOutcome,
        totals: &ImportTotals,
    ) {
        let counter = format!("[{}/{}]", processed, total_rows).dimmed();
        let state = match outcome {
            RowOutcome::Succeeded => outcome.label().green(),
            RowOutcome::Failed => outcome.label().red(),
            RowOutcome::Skipped => outcome.label().dimmed(),
        };
        println!(
            "{} {} {} ({} ok, {} failed, {} skipped)",
            counter,
            row_id.bold(),
            state,
            totals.succeeded,
            totals.failed,
            totals.skipped
        );
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

fn print_summary(outcome: &ImportOutcome, ledger_path: &std::path::Path) {
    println!();
    if outcome.cancelled {
        println!("{}", "Import cancelled before completion.".yellow().bold());
    } else {
        println!("{}", "Import finished.".bold());
    }
    println!(
        "  {} succeeded, {} failed, {} skipped ({} rows processed)",
        outcome.totals.succeeded.to_string().green(),
        outcome.totals.failed.to_string().red(),
        outcome.totals.skipped,
        outcome.totals.processed
    );
    println!("  Ledger: {}", ledger_path.display());

    if !outcome.errors.is_empty() {
        println!();
        println!("{}", "Failed rows:".red().bold());
        for error in &outcome.errors {
            println!("  {} {}", error.row_id.bold(), error.message);
        }
        println!(
            "{}",
            "Rerun the same command to retry failed rows; succeeded rows are skipped."
                .dimmed()
        );
    }
}
