//! Recipe repository: transactional composition writes and filtered reads.
//!
//! A recipe row and its `ingredient_recipe` / `tag_recipe` rows are always
//! written in a single transaction. Reads assemble the full representation in
//! three queries: the recipe rows (with author and caller-relative flags),
//! then the tags and ingredient lines of every listed recipe at once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use foodgram_core::{Amount, CookingTime, IngredientId, RecipeId, TagId, UserId};

use super::RepositoryError;
use super::tags::TagRow;
use super::users::UserRow;
use crate::models::{
    IngredientAmount, PageRequest, RecipeDetail, RecipeFilter, RecipeIngredient, RecipeSummary,
    Tag, User,
};

/// Fields stored for a new recipe.
#[derive(Debug, Clone, Copy)]
pub struct NewRecipe<'a> {
    pub author: UserId,
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: CookingTime,
    /// Stored image path, relative to the media root.
    pub image: Option<&'a str>,
    pub ingredients: &'a [IngredientAmount],
    pub tags: &'a [TagId],
}

/// Changes applied by a partial update. `None` leaves a field untouched;
/// `Some` association lists replace the whole set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipePatch<'a> {
    pub name: Option<&'a str>,
    pub text: Option<&'a str>,
    pub cooking_time: Option<CookingTime>,
    pub image: Option<&'a str>,
    pub ingredients: Option<&'a [IngredientAmount]>,
    pub tags: Option<&'a [TagId]>,
}

/// Ownership data needed to authorize a mutation.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeOwnership {
    pub author_id: UserId,
    pub image: Option<String>,
}

/// One `(name, unit, amount)` line of a user's shopping list, before grouping.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: RecipeId,
    name: String,
    text: String,
    cooking_time: i32,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
    author_id: UserId,
    author_email: String,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
    author_created_at: DateTime<Utc>,
    author_is_subscribed: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: RecipeId,
    name: String,
    image: Option<String>,
    cooking_time: i32,
}

impl TryFrom<SummaryRow> for RecipeSummary {
    type Error = RepositoryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: cooking_time(row.cooking_time)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TagLinkRow {
    recipe_id: RecipeId,
    #[sqlx(flatten)]
    tag: TagRow,
}

#[derive(Debug, sqlx::FromRow)]
struct IngredientLineRow {
    recipe_id: RecipeId,
    id: IngredientId,
    name: String,
    measurement_unit: String,
    amount: Decimal,
}

fn cooking_time(minutes: i32) -> Result<CookingTime, RepositoryError> {
    CookingTime::new(minutes).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid cooking time in database: {e}"))
    })
}

/// `SELECT` of the full representation, with `actor` bound into each
/// caller-relative flag. Ends in an open `WHERE` clause.
fn push_detail_select(qb: &mut QueryBuilder<'_, Postgres>, actor: Option<UserId>) {
    qb.push(
        r"
        SELECT r.id, r.name, r.text, r.cooking_time, r.image, r.pub_date,
               u.id AS author_id, u.email AS author_email, u.username AS author_username,
               u.first_name AS author_first_name, u.last_name AS author_last_name,
               u.created_at AS author_created_at,
               EXISTS (SELECT 1 FROM foodgram.follow f
                       WHERE f.following_id = u.id AND f.user_id = ",
    );
    qb.push_bind(actor);
    qb.push(
        r") AS author_is_subscribed,
               EXISTS (SELECT 1 FROM foodgram.favorite fa
                       WHERE fa.recipe_id = r.id AND fa.user_id = ",
    );
    qb.push_bind(actor);
    qb.push(
        r") AS is_favorited,
               EXISTS (SELECT 1 FROM foodgram.shopping_list_entry s
                       WHERE s.recipe_id = r.id AND s.user_id = ",
    );
    qb.push_bind(actor);
    qb.push(
        r") AS is_in_shopping_cart
        FROM foodgram.recipe r
        JOIN foodgram.user u ON u.id = r.author_id
        WHERE TRUE",
    );
}

/// Append the filter conditions. Caller-relative flags apply only when an
/// actor is present.
fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &RecipeFilter,
    actor: Option<UserId>,
) {
    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ");
        qb.push_bind(author);
    }

    if !filter.tags.is_empty() {
        let slugs: Vec<String> = filter.tags.iter().map(|s| s.as_str().to_owned()).collect();
        // EXISTS rather than a join: a recipe matching several tags is listed once
        qb.push(
            r" AND EXISTS (SELECT 1 FROM foodgram.tag_recipe tr
                           JOIN foodgram.tag t ON t.id = tr.tag_id
                           WHERE tr.recipe_id = r.id AND t.slug = ANY(",
        );
        qb.push_bind(slugs);
        qb.push("))");
    }

    if let Some(actor) = actor {
        if filter.is_favorited {
            qb.push(
                " AND EXISTS (SELECT 1 FROM foodgram.favorite fa2 WHERE fa2.recipe_id = r.id AND fa2.user_id = ",
            );
            qb.push_bind(actor);
            qb.push(")");
        }
        if filter.is_in_shopping_cart {
            qb.push(
                " AND EXISTS (SELECT 1 FROM foodgram.shopping_list_entry s2 WHERE s2.recipe_id = r.id AND s2.user_id = ",
            );
            qb.push_bind(actor);
            qb.push(")");
        }
    }
}

async fn insert_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe: RecipeId,
    ingredients: &[IngredientAmount],
) -> Result<(), RepositoryError> {
    let ids: Vec<i32> = ingredients.iter().map(|i| i.id.as_i32()).collect();
    let amounts: Vec<Decimal> = ingredients.iter().map(|i| i.amount.value()).collect();

    sqlx::query(
        r"
        INSERT INTO foodgram.ingredient_recipe (recipe_id, ingredient_id, amount)
        SELECT $1, ingredient_id, amount
        FROM UNNEST($2::int4[], $3::numeric[]) AS line (ingredient_id, amount)
        ",
    )
    .bind(recipe)
    .bind(&ids)
    .bind(&amounts)
    .execute(&mut **tx)
    .await
    .map_err(RepositoryError::from_write)?;

    Ok(())
}

async fn insert_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe: RecipeId,
    tags: &[TagId],
) -> Result<(), RepositoryError> {
    let ids: Vec<i32> = tags.iter().map(TagId::as_i32).collect();

    sqlx::query(
        r"
        INSERT INTO foodgram.tag_recipe (recipe_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::int4[]) AS link (tag_id)
        ",
    )
    .bind(recipe)
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(RepositoryError::from_write)?;

    Ok(())
}

/// Repository for recipe database operations.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a recipe with its ingredient lines and tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate ingredient or tag,
    /// `RepositoryError::NotFound` for an unknown author, ingredient or tag.
    /// Nothing is written on error.
    pub async fn create(&self, new: NewRecipe<'_>) -> Result<RecipeId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: RecipeId = sqlx::query_scalar(
            r"
            INSERT INTO foodgram.recipe (author_id, name, text, cooking_time, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(new.author)
        .bind(new.name)
        .bind(new.text)
        .bind(new.cooking_time.minutes())
        .bind(new.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        insert_ingredients(&mut tx, id, new.ingredients).await?;
        insert_tags(&mut tx, id, new.tags).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist.
    /// Nothing is written on error.
    pub async fn update(&self, id: RecipeId, patch: RecipePatch<'_>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE foodgram.recipe
            SET name = COALESCE($2, name),
                text = COALESCE($3, text),
                cooking_time = COALESCE($4, cooking_time),
                image = COALESCE($5, image)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.text)
        .bind(patch.cooking_time.map(CookingTime::minutes))
        .bind(patch.image)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(ingredients) = patch.ingredients {
            sqlx::query("DELETE FROM foodgram.ingredient_recipe WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_ingredients(&mut tx, id, ingredients).await?;
        }

        if let Some(tags) = patch.tags {
            sqlx::query("DELETE FROM foodgram.tag_recipe WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_tags(&mut tx, id, tags).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a recipe. Associations and relations cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the recipe does not exist.
    pub async fn delete(&self, id: RecipeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM foodgram.recipe WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Author and stored image of a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ownership(
        &self,
        id: RecipeId,
    ) -> Result<Option<RecipeOwnership>, RepositoryError> {
        Ok(sqlx::query_as::<_, RecipeOwnership>(
            "SELECT author_id, image FROM foodgram.recipe WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// Whether a recipe exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: RecipeId) -> Result<bool, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM foodgram.recipe WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Number of recipes written by `author`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_author(&self, author: UserId) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM foodgram.recipe WHERE author_id = $1")
                .bind(author)
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Full representation of one recipe as seen by `actor`.
    ///
    /// `image` holds the stored relative path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        id: RecipeId,
        actor: Option<UserId>,
    ) -> Result<Option<RecipeDetail>, RepositoryError> {
        let mut qb = QueryBuilder::new("");
        push_detail_select(&mut qb, actor);
        qb.push(" AND r.id = ");
        qb.push_bind(id);

        let rows = qb
            .build_query_as::<RecipeRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(self.assemble(rows).await?.into_iter().next())
    }

    /// One page of recipes matching `filter`, newest first, as seen by `actor`.
    ///
    /// Returns the page and the total number of matching recipes. `image`
    /// holds the stored relative path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        actor: Option<UserId>,
        page: PageRequest,
    ) -> Result<(Vec<RecipeDetail>, i64), RepositoryError> {
        let mut qb = QueryBuilder::new("");
        push_detail_select(&mut qb, actor);
        push_filters(&mut qb, filter, actor);
        qb.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<RecipeRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM foodgram.recipe r WHERE TRUE");
        push_filters(&mut count_qb, filter, actor);
        let count: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok((self.assemble(rows).await?, count))
    }

    /// Short representation of one recipe. `image` holds the stored path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, id: RecipeId) -> Result<Option<RecipeSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, image, cooking_time FROM foodgram.recipe WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(RecipeSummary::try_from).transpose()
    }

    /// Newest recipes of each author, at most `per_author` each when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summaries_by_author(
        &self,
        authors: &[UserId],
        per_author: Option<i64>,
    ) -> Result<HashMap<UserId, Vec<RecipeSummary>>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            author_id: UserId,
            #[sqlx(flatten)]
            summary: SummaryRow,
        }

        let ids: Vec<i32> = authors.iter().map(UserId::as_i32).collect();
        let rows = sqlx::query_as::<_, Row>(
            r"
            SELECT author_id, id, name, image, cooking_time
            FROM (
                SELECT author_id, id, name, image, cooking_time, pub_date,
                       ROW_NUMBER() OVER (
                           PARTITION BY author_id ORDER BY pub_date DESC, id DESC
                       ) AS position
                FROM foodgram.recipe
                WHERE author_id = ANY($1)
            ) ranked
            WHERE $2::int8 IS NULL OR position <= $2
            ORDER BY author_id, position
            ",
        )
        .bind(&ids)
        .bind(per_author)
        .fetch_all(self.pool)
        .await?;

        let mut by_author: HashMap<UserId, Vec<RecipeSummary>> = HashMap::new();
        for row in rows {
            by_author
                .entry(row.author_id)
                .or_default()
                .push(RecipeSummary::try_from(row.summary)?);
        }
        Ok(by_author)
    }

    /// Every ingredient line of every recipe in `user`'s shopping list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shopping_lines(&self, user: UserId) -> Result<Vec<ShoppingLine>, RepositoryError> {
        Ok(sqlx::query_as::<_, ShoppingLine>(
            r"
            SELECT i.name, i.measurement_unit, ir.amount
            FROM foodgram.shopping_list_entry s
            JOIN foodgram.ingredient_recipe ir ON ir.recipe_id = s.recipe_id
            JOIN foodgram.ingredient i ON i.id = ir.ingredient_id
            WHERE s.user_id = $1
            ",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?)
    }

    /// Attach tags and ingredient lines to recipe rows, keeping row order.
    async fn assemble(&self, rows: Vec<RecipeRow>) -> Result<Vec<RecipeDetail>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();

        let tag_rows = sqlx::query_as::<_, TagLinkRow>(
            r"
            SELECT tr.recipe_id, t.id, t.name, t.color, t.slug
            FROM foodgram.tag_recipe tr
            JOIN foodgram.tag t ON t.id = tr.tag_id
            WHERE tr.recipe_id = ANY($1)
            ORDER BY t.name
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let line_rows = sqlx::query_as::<_, IngredientLineRow>(
            r"
            SELECT ir.recipe_id, i.id, i.name, i.measurement_unit, ir.amount
            FROM foodgram.ingredient_recipe ir
            JOIN foodgram.ingredient i ON i.id = ir.ingredient_id
            WHERE ir.recipe_id = ANY($1)
            ORDER BY ir.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut tags: HashMap<RecipeId, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.recipe_id)
                .or_default()
                .push(Tag::try_from(row.tag)?);
        }

        let mut lines: HashMap<RecipeId, Vec<RecipeIngredient>> = HashMap::new();
        for row in line_rows {
            let amount = Amount::new(row.amount).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid amount in database: {e}"))
            })?;
            lines.entry(row.recipe_id).or_default().push(RecipeIngredient {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount,
            });
        }

        rows.into_iter()
            .map(|row| -> Result<RecipeDetail, RepositoryError> {
                let author = User::try_from(UserRow {
                    id: row.author_id,
                    email: row.author_email,
                    username: row.author_username,
                    first_name: row.author_first_name,
                    last_name: row.author_last_name,
                    created_at: row.author_created_at,
                })?;

                Ok(RecipeDetail {
                    id: row.id,
                    tags: tags.remove(&row.id).unwrap_or_default(),
                    author: author.into_view(row.author_is_subscribed),
                    ingredients: lines.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                    image: row.image,
                    text: row.text,
                    cooking_time: cooking_time(row.cooking_time)?,
                    is_favorited: row.is_favorited,
                    is_in_shopping_cart: row.is_in_shopping_cart,
                    pub_date: row.pub_date,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_core::Slug;

    fn sql_for(filter: &RecipeFilter, actor: Option<UserId>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM foodgram.recipe r WHERE TRUE");
        push_filters(&mut qb, filter, actor);
        qb.sql().to_owned()
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        assert_eq!(
            sql_for(&RecipeFilter::default(), None),
            "SELECT 1 FROM foodgram.recipe r WHERE TRUE"
        );
    }

    #[test]
    fn test_tag_filter_uses_any() {
        let filter = RecipeFilter {
            tags: vec![Slug::parse("lunch").unwrap()],
            ..RecipeFilter::default()
        };
        let sql = sql_for(&filter, None);
        assert!(sql.contains("t.slug = ANY($1)"));
    }

    #[test]
    fn test_personal_flags_need_actor() {
        let filter = RecipeFilter {
            is_favorited: true,
            is_in_shopping_cart: true,
            ..RecipeFilter::default()
        };
        assert!(!sql_for(&filter, None).contains("favorite"));

        let sql = sql_for(&filter, Some(UserId::new(1)));
        assert!(sql.contains("foodgram.favorite"));
        assert!(sql.contains("foodgram.shopping_list_entry"));
    }

    #[test]
    fn test_detail_select_binds_actor_three_times() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_detail_select(&mut qb, None);
        let sql = qb.sql();
        assert!(sql.contains("$3"));
        assert!(!sql.contains("$4"));
    }
}
