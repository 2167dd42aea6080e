//! Relation repository: favorites, shopping-list entries and follows.
//!
//! All three are `(user_id, target)` join rows under a unique constraint.
//! Inserts do not pre-check for an existing row; the constraint rejects the
//! duplicate and the error surfaces as [`RepositoryError::Conflict`].

use sqlx::PgPool;

use foodgram_core::{RelationKind, UserId};

use super::RepositoryError;
use super::users::UserRow;
use crate::models::{PageRequest, User, UserView};

/// Physical location of a relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RelationTable {
    table: &'static str,
    target_column: &'static str,
}

const fn table_for(kind: RelationKind) -> RelationTable {
    match kind {
        RelationKind::Favorite => RelationTable {
            table: "foodgram.favorite",
            target_column: "recipe_id",
        },
        RelationKind::ShoppingCart => RelationTable {
            table: "foodgram.shopping_list_entry",
            target_column: "recipe_id",
        },
        RelationKind::Follow => RelationTable {
            table: "foodgram.follow",
            target_column: "following_id",
        },
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FollowedRow {
    #[sqlx(flatten)]
    user: UserRow,
    recipes_count: i64,
}

/// Repository for user relations.
pub struct RelationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RelationRepository<'a> {
    /// Create a new relation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a relation row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the relation already exists.
    /// Returns `RepositoryError::NotFound` if the user or target does not exist.
    pub async fn insert(
        &self,
        kind: RelationKind,
        user: UserId,
        target: i32,
    ) -> Result<(), RepositoryError> {
        let RelationTable {
            table,
            target_column,
        } = table_for(kind);
        let sql = format!("INSERT INTO {table} (user_id, {target_column}) VALUES ($1, $2)");

        sqlx::query(&sql)
            .bind(user)
            .bind(target)
            .execute(self.pool)
            .await
            .map_err(RepositoryError::from_write)?;
        Ok(())
    }

    /// Delete a relation row. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        kind: RelationKind,
        user: UserId,
        target: i32,
    ) -> Result<bool, RepositoryError> {
        let RelationTable {
            table,
            target_column,
        } = table_for(kind);
        let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND {target_column} = $2");

        let result = sqlx::query(&sql)
            .bind(user)
            .bind(target)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One page of the users `user` follows, most recent follow first, each
    /// with their total recipe count.
    ///
    /// Returns the page and the total number of followed users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn followed(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<(Vec<(UserView, i64)>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, FollowedRow>(
            r"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.created_at,
                   (SELECT COUNT(*) FROM foodgram.recipe r WHERE r.author_id = u.id)
                       AS recipes_count
            FROM foodgram.follow f
            JOIN foodgram.user u ON u.id = f.following_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM foodgram.follow WHERE user_id = $1")
                .bind(user)
                .fetch_one(self.pool)
                .await?;

        let followed = rows
            .into_iter()
            .map(|row| Ok((User::try_from(row.user)?.into_view(true), row.recipes_count)))
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Ok((followed, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_relations_target_recipes() {
        for kind in [RelationKind::Favorite, RelationKind::ShoppingCart] {
            assert_eq!(table_for(kind).target_column, "recipe_id");
        }
        assert_eq!(table_for(RelationKind::Follow).target_column, "following_id");
    }

    #[test]
    fn test_every_kind_has_its_own_table() {
        let tables: Vec<_> = RelationKind::ALL.iter().map(|k| table_for(*k).table).collect();
        for (i, table) in tables.iter().enumerate() {
            assert!(!tables[i + 1..].contains(table));
        }
    }
}
