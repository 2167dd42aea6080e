//! Ingredient repository.
//!
//! Search is case-insensitive: names starting with the query rank before
//! names that merely contain it.

use sqlx::PgPool;

use foodgram_core::IngredientId;

use super::{RepositoryError, escape_like};
use crate::models::Ingredient;

/// Maximum rows returned by a search.
pub const SEARCH_LIMIT: i64 = 100;

#[derive(Debug, sqlx::FromRow)]
struct IngredientRow {
    id: IngredientId,
    name: String,
    measurement_unit: String,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
        }
    }
}

/// Repository for ingredient reads and bulk loading.
pub struct IngredientRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IngredientRepository<'a> {
    /// Create a new ingredient repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search ingredients by name.
    ///
    /// An empty or absent query lists ingredients by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Ingredient>, RepositoryError> {
        let query = query.map(str::trim).unwrap_or_default();

        let rows = if query.is_empty() {
            sqlx::query_as::<_, IngredientRow>(
                r"
                SELECT id, name, measurement_unit
                FROM foodgram.ingredient
                ORDER BY name, measurement_unit
                LIMIT $1
                ",
            )
            .bind(SEARCH_LIMIT)
            .fetch_all(self.pool)
            .await?
        } else {
            let escaped = escape_like(&query.to_lowercase());
            sqlx::query_as::<_, IngredientRow>(
                r"
                SELECT id, name, measurement_unit
                FROM foodgram.ingredient
                WHERE lower(name) LIKE '%' || $1 || '%' ESCAPE '\'
                ORDER BY (lower(name) LIKE $1 || '%' ESCAPE '\') DESC, name, measurement_unit
                LIMIT $2
                ",
            )
            .bind(escaped)
            .bind(SEARCH_LIMIT)
            .fetch_all(self.pool)
            .await?
        };

        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    /// Get an ingredient by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: IngredientId) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, IngredientRow>(
            "SELECT id, name, measurement_unit FROM foodgram.ingredient WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Ingredient::from))
    }

    /// The first of `ids` (in the given order) that names no ingredient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_missing(
        &self,
        ids: &[IngredientId],
    ) -> Result<Option<IngredientId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(IngredientId::as_i32).collect();
        let found: Vec<IngredientId> =
            sqlx::query_scalar("SELECT id FROM foodgram.ingredient WHERE id = ANY($1)")
                .bind(&raw)
                .fetch_all(self.pool)
                .await?;

        Ok(ids.iter().copied().find(|id| !found.contains(id)))
    }

    /// Insert `(name, measurement_unit)` pairs in one transaction, skipping
    /// pairs that already exist.
    ///
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// inserted in that case.
    pub async fn load(&self, items: &[(String, String)]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for (name, unit) in items {
            let result = sqlx::query(
                r"
                INSERT INTO foodgram.ingredient (name, measurement_unit)
                VALUES ($1, $2)
                ON CONFLICT (name, measurement_unit) DO NOTHING
                ",
            )
            .bind(name)
            .bind(unit)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
