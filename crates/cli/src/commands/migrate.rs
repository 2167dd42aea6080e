//! Database migration command.
//!
//! Migrations are embedded from `crates/api/migrations/`.

use foodgram_api::db::MIGRATOR;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
