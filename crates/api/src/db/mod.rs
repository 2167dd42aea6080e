//! Database operations for the Foodgram `PostgreSQL` store.
//!
//! # Schema: `foodgram`
//!
//! ## Tables
//!
//! - `user` - Accounts (unique username and email)
//! - `tag`, `ingredient` - Reference data
//! - `recipe` - Recipes, cascade-deleted with their author
//! - `ingredient_recipe`, `tag_recipe` - Recipe associations
//! - `follow`, `favorite`, `shopping_list_entry` - Toggled user relations
//!
//! Every uniqueness and cascade rule lives in the schema, so a concurrent
//! duplicate insert is rejected by `PostgreSQL` and surfaces here as
//! [`RepositoryError::Conflict`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p foodgram-cli -- migrate
//! ```

pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod tags;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use ingredients::IngredientRepository;
pub use recipes::RecipeRepository;
pub use relations::RelationRepository;
pub use tags::TagRepository;
pub use users::UserRepository;

/// Embedded migrations for the `foodgram` schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity (or a referenced one) was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation, carrying the constraint name.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classify a write error: unique violations become `Conflict`,
    /// foreign-key violations become `NotFound`.
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.constraint().unwrap_or("unique").to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("flour"), "flour");
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
    }

    #[test]
    fn test_non_database_errors_stay_database() {
        assert!(matches!(
            RepositoryError::from_write(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }
}
