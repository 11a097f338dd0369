//! Command-line interface definitions

pub mod import;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "formway-cli",
    about = "Import spreadsheet data into a Formway workflow engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import workbook rows as new workflow elements
    Import(ImportArgs),
    /// Summarize a status ledger file from a previous run
    Status(StatusArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    /// Path to the TOML configuration file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Workbook containing the mapping sheet and data rows
    #[arg(short, long)]
    pub input: PathBuf,

    /// Name of the sheet holding the field mappings
    #[arg(long, default_value = "Mappings")]
    pub mapping_sheet: String,

    /// Name of the sheet holding the data rows (defaults to the first
    /// sheet that is not a mapping sheet)
    #[arg(long)]
    pub data_sheet: Option<String>,

    /// Status ledger CSV path (overrides the config; defaults to a
    /// .status.csv file next to the input workbook)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Build and print the request payloads without calling the API or
    /// touching the ledger
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Status ledger CSV path
    #[arg(long)]
    pub ledger: PathBuf,
}
