//! Foodgram CLI - Database migrations and reference data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! foodgram migrate
//!
//! # Bulk-load ingredients from a `name,measurement_unit` file
//! foodgram load-ingredients data/ingredients.csv
//! ```
//!
//! Both commands read `FOODGRAM_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about = "Foodgram operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Load ingredients from a CSV file without a header row
    LoadIngredients {
        /// Path to a file of `name,measurement_unit` records
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::LoadIngredients { path } => commands::ingredients::load(&path).await?,
    }
    Ok(())
}
