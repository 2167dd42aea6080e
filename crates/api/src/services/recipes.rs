//! Recipe composition and queries.
//!
//! Create and update validate the whole payload before touching storage, then
//! write the recipe row and its association sets in one transaction. On update,
//! `ingredients` and `tags` are replaced only when their key is present.

use std::collections::HashSet;
use std::hash::Hash;

use sqlx::PgPool;
use tracing::instrument;

use foodgram_core::{IngredientId, RecipeId, TagId, UserId};

use super::ServiceError;
use super::images::ImageStore;
use crate::db::recipes::{NewRecipe, RecipePatch};
use crate::db::{IngredientRepository, RecipeRepository, RepositoryError, TagRepository};
use crate::error::ValidationError;
use crate::models::{
    IngredientAmount, Page, PageRequest, RecipeChanges, RecipeDetail, RecipeDraft, RecipeFilter,
};

/// Longest recipe name.
pub const MAX_NAME_LENGTH: usize = 200;

/// How an update request treats absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSemantics {
    /// Absent fields are left unchanged (`PATCH`).
    Partial,
    /// The payload replaces the whole resource (`PUT`).
    FullReplace,
}

/// Only partial updates are offered.
///
/// # Errors
///
/// Returns `ServiceError::MethodNotAllowed` for full-replace semantics.
pub const fn check_semantics(semantics: UpdateSemantics) -> Result<(), ServiceError> {
    match semantics {
        UpdateSemantics::Partial => Ok(()),
        UpdateSemantics::FullReplace => Err(ServiceError::MethodNotAllowed("PUT")),
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("text", "must not be empty"));
    }
    Ok(())
}

/// The first id that occurs more than once.
fn first_duplicate<T: Copy + Eq + Hash>(ids: impl IntoIterator<Item = T>) -> Option<T> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}

fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), ValidationError> {
    if ingredients.is_empty() {
        return Err(ValidationError::new("ingredients", "at least one ingredient is required"));
    }
    if let Some(id) = first_duplicate(ingredients.iter().map(|i| i.id)) {
        return Err(ValidationError::new(
            "ingredients",
            format!("ingredient {id} is listed more than once"),
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[TagId]) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::new("tags", "at least one tag is required"));
    }
    if let Some(id) = first_duplicate(tags.iter().copied()) {
        return Err(ValidationError::new(
            "tags",
            format!("tag {id} is listed more than once"),
        ));
    }
    Ok(())
}

/// Storage-free validation of a create payload.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_draft(draft: &RecipeDraft) -> Result<(), ValidationError> {
    validate_name(&draft.name)?;
    validate_text(&draft.text)?;
    validate_ingredients(&draft.ingredients)?;
    validate_tags(&draft.tags)
}

/// Storage-free validation of the fields present in an update payload.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_changes(changes: &RecipeChanges) -> Result<(), ValidationError> {
    if let Some(name) = &changes.name {
        validate_name(name)?;
    }
    if let Some(text) = &changes.text {
        validate_text(text)?;
    }
    if let Some(ingredients) = &changes.ingredients {
        validate_ingredients(ingredients)?;
    }
    if let Some(tags) = &changes.tags {
        validate_tags(tags)?;
    }
    Ok(())
}

/// Recipe service.
pub struct RecipeService<'a> {
    recipes: RecipeRepository<'a>,
    ingredients: IngredientRepository<'a>,
    tags: TagRepository<'a>,
    images: &'a ImageStore,
}

impl<'a> RecipeService<'a> {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, images: &'a ImageStore) -> Self {
        Self {
            recipes: RecipeRepository::new(pool),
            ingredients: IngredientRepository::new(pool),
            tags: TagRepository::new(pool),
            images,
        }
    }

    /// Create a recipe authored by `actor`.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` for an invalid payload, a duplicated
    ///   ingredient or tag id, or an id that names nothing.
    /// - `ServiceError::Image` for an undecodable image.
    #[instrument(skip_all, fields(actor = %actor))]
    pub async fn create(
        &self,
        actor: UserId,
        draft: &RecipeDraft,
    ) -> Result<RecipeDetail, ServiceError> {
        validate_draft(draft)?;
        self.check_references(Some(&draft.ingredients), Some(&draft.tags))
            .await?;

        let image = match &draft.image {
            Some(uri) => Some(self.images.save_data_uri(uri).await?),
            None => None,
        };

        let created = self
            .recipes
            .create(NewRecipe {
                author: actor,
                name: draft.name.trim(),
                text: &draft.text,
                cooking_time: draft.cooking_time,
                image: image.as_deref(),
                ingredients: &draft.ingredients,
                tags: &draft.tags,
            })
            .await;

        let id = match created {
            Ok(id) => id,
            Err(e) => {
                if let Some(path) = &image {
                    self.images.remove(path).await;
                }
                return Err(map_write_error(e));
            }
        };

        tracing::info!(recipe_id = %id, "Recipe created");
        self.get(id, Some(actor)).await
    }

    /// Update a recipe. Only its author may do so.
    ///
    /// # Errors
    ///
    /// - `ServiceError::MethodNotAllowed` for full-replace semantics.
    /// - `ServiceError::NotFound` if the recipe does not exist.
    /// - `ServiceError::PermissionDenied` if `actor` is not the author.
    /// - `ServiceError::Validation` as for [`Self::create`].
    #[instrument(skip_all, fields(actor = %actor, recipe_id = %id))]
    pub async fn update(
        &self,
        actor: UserId,
        id: RecipeId,
        semantics: UpdateSemantics,
        changes: &RecipeChanges,
    ) -> Result<RecipeDetail, ServiceError> {
        check_semantics(semantics)?;

        let ownership = self
            .recipes
            .ownership(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("recipe".to_owned()))?;
        if ownership.author_id != actor {
            return Err(ServiceError::PermissionDenied);
        }

        validate_changes(changes)?;
        self.check_references(changes.ingredients.as_deref(), changes.tags.as_deref())
            .await?;

        let image = match &changes.image {
            Some(uri) => Some(self.images.save_data_uri(uri).await?),
            None => None,
        };

        let updated = self
            .recipes
            .update(
                id,
                RecipePatch {
                    name: changes.name.as_deref().map(str::trim),
                    text: changes.text.as_deref(),
                    cooking_time: changes.cooking_time,
                    image: image.as_deref(),
                    ingredients: changes.ingredients.as_deref(),
                    tags: changes.tags.as_deref(),
                },
            )
            .await;

        if let Err(e) = updated {
            if let Some(path) = &image {
                self.images.remove(path).await;
            }
            return Err(map_write_error(e));
        }

        if image.is_some()
            && let Some(old) = &ownership.image
        {
            self.images.remove(old).await;
        }

        tracing::info!("Recipe updated");
        self.get(id, Some(actor)).await
    }

    /// Delete a recipe. Only its author may do so.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the recipe does not exist.
    /// - `ServiceError::PermissionDenied` if `actor` is not the author.
    #[instrument(skip_all, fields(actor = %actor, recipe_id = %id))]
    pub async fn delete(&self, actor: UserId, id: RecipeId) -> Result<(), ServiceError> {
        let ownership = self
            .recipes
            .ownership(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("recipe".to_owned()))?;
        if ownership.author_id != actor {
            return Err(ServiceError::PermissionDenied);
        }

        self.recipes.delete(id).await.map_err(map_write_error)?;
        if let Some(path) = &ownership.image {
            self.images.remove(path).await;
        }

        tracing::info!("Recipe deleted");
        Ok(())
    }

    /// One recipe as seen by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the recipe does not exist.
    pub async fn get(
        &self,
        id: RecipeId,
        actor: Option<UserId>,
    ) -> Result<RecipeDetail, ServiceError> {
        let detail = self
            .recipes
            .get(id, actor)
            .await?
            .ok_or_else(|| ServiceError::NotFound("recipe".to_owned()))?;
        Ok(self.resolve(detail))
    }

    /// One page of recipes matching `filter`, newest first.
    ///
    /// Favorite and shopping-cart filters are ignored for anonymous callers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip_all, fields(actor = ?actor, page = page.page))]
    pub async fn list(
        &self,
        filter: RecipeFilter,
        actor: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<RecipeDetail>, ServiceError> {
        let filter = filter.for_actor(actor);
        let (recipes, count) = self.recipes.list(&filter, actor, page).await?;
        Ok(Page::new(recipes, count, page).map(|detail| self.resolve(detail)))
    }

    /// Check that every referenced ingredient and tag exists.
    async fn check_references(
        &self,
        ingredients: Option<&[IngredientAmount]>,
        tags: Option<&[TagId]>,
    ) -> Result<(), ServiceError> {
        if let Some(ingredients) = ingredients {
            let ids: Vec<IngredientId> = ingredients.iter().map(|i| i.id).collect();
            if let Some(missing) = self.ingredients.first_missing(&ids).await? {
                return Err(ValidationError::new(
                    "ingredients",
                    format!("ingredient {missing} does not exist"),
                )
                .into());
            }
        }
        if let Some(tags) = tags
            && let Some(missing) = self.tags.first_missing(tags).await?
        {
            return Err(ValidationError::new("tags", format!("tag {missing} does not exist")).into());
        }
        Ok(())
    }

    fn resolve(&self, mut detail: RecipeDetail) -> RecipeDetail {
        detail.image = detail.image.map(|path| self.images.url_for(&path));
        detail
    }
}

/// Map a composition write error. A reference that vanished between the
/// existence check and the insert surfaces as a foreign-key violation.
fn map_write_error(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::NotFound => ServiceError::NotFound("recipe or referenced object".to_owned()),
        RepositoryError::Conflict(constraint) => ServiceError::Validation(ValidationError::new(
            if constraint.starts_with("tag") {
                "tags"
            } else {
                "ingredients"
            },
            "duplicate entry",
        )),
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foodgram_core::{Amount, CookingTime};
    use rust_decimal::Decimal;

    fn line(id: i32) -> IngredientAmount {
        IngredientAmount {
            id: IngredientId::new(id),
            amount: Amount::new(Decimal::from(10)).unwrap(),
        }
    }

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: "Pancakes".to_owned(),
            text: "Mix and fry.".to_owned(),
            cooking_time: CookingTime::new(20).unwrap(),
            image: None,
            ingredients: vec![line(1), line(2)],
            tags: vec![TagId::new(1)],
        }
    }

    #[test]
    fn test_put_is_not_allowed() {
        assert!(check_semantics(UpdateSemantics::Partial).is_ok());
        assert!(matches!(
            check_semantics(UpdateSemantics::FullReplace),
            Err(ServiceError::MethodNotAllowed("PUT"))
        ));
    }

    #[test]
    fn test_valid_draft() {
        assert!(validate_draft(&draft()).is_ok());
    }

    #[test]
    fn test_duplicate_ingredient_names_id() {
        let mut d = draft();
        d.ingredients = vec![line(1), line(7), line(7)];
        let err = validate_draft(&d).unwrap_err();
        assert_eq!(err.field, "ingredients");
        assert!(err.message.contains('7'));
    }

    #[test]
    fn test_duplicate_tag_names_id() {
        let mut d = draft();
        d.tags = vec![TagId::new(3), TagId::new(3)];
        let err = validate_draft(&d).unwrap_err();
        assert_eq!(err.field, "tags");
        assert!(err.message.contains('3'));
    }

    #[test]
    fn test_empty_lists_rejected() {
        let mut d = draft();
        d.ingredients.clear();
        assert_eq!(validate_draft(&d).unwrap_err().field, "ingredients");

        let mut d = draft();
        d.tags.clear();
        assert_eq!(validate_draft(&d).unwrap_err().field, "tags");
    }

    #[test]
    fn test_blank_name_and_text_rejected() {
        let mut d = draft();
        d.name = "   ".to_owned();
        assert_eq!(validate_draft(&d).unwrap_err().field, "name");

        let mut d = draft();
        d.text = String::new();
        assert_eq!(validate_draft(&d).unwrap_err().field, "text");

        let mut d = draft();
        d.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(validate_draft(&d).unwrap_err().field, "name");
    }

    #[test]
    fn test_changes_only_check_present_fields() {
        assert!(validate_changes(&RecipeChanges::default()).is_ok());

        let changes = RecipeChanges {
            tags: Some(vec![]),
            ..RecipeChanges::default()
        };
        assert_eq!(validate_changes(&changes).unwrap_err().field, "tags");

        let changes = RecipeChanges {
            ingredients: Some(vec![line(4), line(4)]),
            ..RecipeChanges::default()
        };
        assert_eq!(validate_changes(&changes).unwrap_err().field, "ingredients");
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(first_duplicate([1, 2, 3]), None);
        assert_eq!(first_duplicate([1, 2, 1, 2]), Some(1));
    }
}
