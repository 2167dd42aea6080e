//! CLI command implementations.

pub mod ingredients;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the database named by `FOODGRAM_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if neither variable is set or the connection fails.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FOODGRAM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "FOODGRAM_DATABASE_URL not set")?;

    tracing::info!("Connecting to database...");
    Ok(foodgram_api::db::create_pool(&database_url).await?)
}
