//! Relation toggles: favorites, shopping cart and follows.
//!
//! Toggles are explicit, not idempotent: adding an existing relation or
//! removing a missing one is a conflict. Adding relies on the table's unique
//! constraint rather than a prior existence check, so two concurrent adds
//! cannot both succeed.

use sqlx::PgPool;
use tracing::instrument;

use foodgram_core::{RecipeId, RelationKind, UserId};

use super::ServiceError;
use super::images::ImageStore;
use crate::db::{RecipeRepository, RelationRepository, RepositoryError, UserRepository};
use crate::error::{NON_FIELD_KEY, ValidationError};
use crate::models::{Page, PageRequest, RecipeSummary, SubscriptionView};

/// What a relation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationTarget {
    Recipe(RecipeId),
    User(UserId),
}

impl RelationTarget {
    const fn raw(self) -> i32 {
        match self {
            Self::Recipe(id) => id.as_i32(),
            Self::User(id) => id.as_i32(),
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            Self::Recipe(_) => "recipe",
            Self::User(_) => "user",
        }
    }
}

/// Direction of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove,
}

/// Checks that need no storage: the target matches the relation kind, and a
/// user never follows themselves.
///
/// # Errors
///
/// Returns `ServiceError::Validation` when either check fails.
pub fn check_toggle(
    actor: UserId,
    kind: RelationKind,
    target: RelationTarget,
) -> Result<(), ServiceError> {
    let targets_user = matches!(target, RelationTarget::User(_));
    if kind.targets_user() != targets_user {
        return Err(ValidationError::new(
            NON_FIELD_KEY,
            format!("{kind} relations cannot target a {}", target.noun()),
        )
        .into());
    }
    if target == RelationTarget::User(actor) {
        return Err(ValidationError::new(NON_FIELD_KEY, "you cannot subscribe to yourself").into());
    }
    Ok(())
}

/// Relation service.
pub struct RelationService<'a> {
    relations: RelationRepository<'a>,
    recipes: RecipeRepository<'a>,
    users: UserRepository<'a>,
    images: &'a ImageStore,
}

impl<'a> RelationService<'a> {
    /// Create a new relation service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, images: &'a ImageStore) -> Self {
        Self {
            relations: RelationRepository::new(pool),
            recipes: RecipeRepository::new(pool),
            users: UserRepository::new(pool),
            images,
        }
    }

    /// Add or remove a relation between `actor` and `target`.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` for a self-follow, before any storage access.
    /// - `ServiceError::NotFound` if the target does not exist.
    /// - `ServiceError::Conflict` when adding an existing relation or
    ///   removing a missing one.
    #[instrument(skip_all, fields(actor = %actor, kind = %kind, ?target, ?action))]
    pub async fn toggle(
        &self,
        actor: UserId,
        kind: RelationKind,
        target: RelationTarget,
        action: ToggleAction,
    ) -> Result<(), ServiceError> {
        check_toggle(actor, kind, target)?;

        match action {
            ToggleAction::Add => {
                self.relations
                    .insert(kind, actor, target.raw())
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => {
                            ServiceError::Conflict(format!("{} already exists", kind.describe()))
                        }
                        RepositoryError::NotFound => ServiceError::NotFound(target.noun().to_owned()),
                        other => ServiceError::Repository(other),
                    })?;
                tracing::info!("Relation added");
            }
            ToggleAction::Remove => {
                if !self.target_exists(target).await? {
                    return Err(ServiceError::NotFound(target.noun().to_owned()));
                }
                let removed = self.relations.delete(kind, actor, target.raw()).await?;
                if !removed {
                    return Err(ServiceError::Conflict(format!(
                        "{} does not exist",
                        kind.describe()
                    )));
                }
                tracing::info!("Relation removed");
            }
        }
        Ok(())
    }

    /// Short form of a recipe, with its image URL resolved.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the recipe does not exist.
    pub async fn recipe_summary(&self, id: RecipeId) -> Result<RecipeSummary, ServiceError> {
        let summary = self
            .recipes
            .summary(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("recipe".to_owned()))?;
        Ok(self.resolve(summary))
    }

    /// A followed user as listed under subscriptions.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    pub async fn subscription(
        &self,
        actor: UserId,
        author: UserId,
        recipes_limit: Option<i64>,
    ) -> Result<SubscriptionView, ServiceError> {
        let user = self
            .users
            .get_view(author, Some(actor))
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_owned()))?;
        let recipes_count = self.recipes.count_by_author(author).await?;
        let mut recipes = self
            .recipes
            .summaries_by_author(&[author], recipes_limit)
            .await?;

        Ok(SubscriptionView {
            user,
            recipes_count,
            recipes: self.resolve_all(recipes.remove(&author).unwrap_or_default()),
        })
    }

    /// One page of the users `actor` follows, each with their newest recipes.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if a query fails.
    #[instrument(skip_all, fields(actor = %actor, page = page.page))]
    pub async fn subscriptions(
        &self,
        actor: UserId,
        page: PageRequest,
        recipes_limit: Option<i64>,
    ) -> Result<Page<SubscriptionView>, ServiceError> {
        let (followed, count) = self.relations.followed(actor, page).await?;
        let authors: Vec<UserId> = followed.iter().map(|(user, _)| user.id).collect();
        let mut recipes = self
            .recipes
            .summaries_by_author(&authors, recipes_limit)
            .await?;

        let views = followed
            .into_iter()
            .map(|(user, recipes_count)| {
                let authored = recipes.remove(&user.id).unwrap_or_default();
                SubscriptionView {
                    user,
                    recipes_count,
                    recipes: self.resolve_all(authored),
                }
            })
            .collect();

        Ok(Page::new(views, count, page))
    }

    async fn target_exists(&self, target: RelationTarget) -> Result<bool, RepositoryError> {
        match target {
            RelationTarget::Recipe(id) => self.recipes.exists(id).await,
            RelationTarget::User(id) => Ok(self.users.get_by_id(id).await?.is_some()),
        }
    }

    fn resolve(&self, mut summary: RecipeSummary) -> RecipeSummary {
        summary.image = summary.image.map(|path| self.images.url_for(&path));
        summary
    }

    fn resolve_all(&self, summaries: Vec<RecipeSummary>) -> Vec<RecipeSummary> {
        summaries.into_iter().map(|s| self.resolve(s)).collect()
    }
}
