//! Tag repository.

use sqlx::PgPool;

use foodgram_core::{HexColor, Slug, TagId};

use super::RepositoryError;
use crate::models::Tag;

/// Raw `foodgram.tag` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TagRow {
    pub id: TagId,
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = RepositoryError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;
        let color = row
            .color
            .as_deref()
            .map(HexColor::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid color in database: {e}")))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            color,
            slug,
        })
    }
}

/// Repository for tag reads.
pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All tags, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, slug FROM foodgram.tag ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Tag::try_from).collect()
    }

    /// Get a tag by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, slug FROM foodgram.tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Tag::try_from).transpose()
    }

    /// The first of `ids` (in the given order) that names no tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_missing(&self, ids: &[TagId]) -> Result<Option<TagId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(TagId::as_i32).collect();
        let found: Vec<TagId> =
            sqlx::query_scalar("SELECT id FROM foodgram.tag WHERE id = ANY($1)")
                .bind(&raw)
                .fetch_all(self.pool)
                .await?;

        Ok(ids.iter().copied().find(|id| !found.contains(id)))
    }
}
