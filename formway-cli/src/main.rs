use anyhow::Result;
use clap::Parser;

mod api;
mod cli;
mod config;
mod excel;
mod import;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();
    match args.command {
        cli::Commands::Import(args) => cli::import::handle_import_command(args).await,
        cli::Commands::Status(args) => cli::status::handle_status_command(args),
    }
}
