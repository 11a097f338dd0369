//! Ledger status command handler

use anyhow::{Context, Result, bail};
use colored::*;

use super::StatusArgs;
use crate::import::Ledger;

/// How many failed rows to list before truncating
const MAX_LISTED_ERRORS: usize = 20;

pub fn handle_status_command(args: StatusArgs) -> Result<()> {
    if !args.ledger.exists() {
        bail!("Ledger file does not exist: {}", args.ledger.display());
    }

    let ledger = Ledger::new(&args.ledger);
    let summary = ledger
        .summary()
        .with_context(|| format!("Failed to read ledger: {}", args.ledger.display()))?;

    println!("{}", args.ledger.display().to_string().bold());
    if let Some(started) = &summary.started_at {
        println!("  Run started: {}", started);
    }
    if let Some(ended) = &summary.ended_at {
        println!("  Run ended:   {}", ended);
    }
    println!(
        "  {} rows: {} succeeded, {} failed, {} not started",
        summary.total,
        summary.succeeded.to_string().green(),
        summary.failed.to_string().red(),
        summary.not_started
    );

    if !summary.errors.is_empty() {
        println!();
        println!("{}", "Failed rows:".red().bold());
        for (row_id, message) in summary.errors.iter().take(MAX_LISTED_ERRORS) {
            println!("  {} {}", row_id.bold(), message);
        }
        if summary.errors.len() > MAX_LISTED_ERRORS {
            println!(
                "  {}",
                format!("... and {} more", summary.errors.len() - MAX_LISTED_ERRORS).dimmed()
            );
        }
    }

    Ok(())
}
