//! Recipe handlers: composition, queries, relation toggles and the
//! shopping list download.

use axum::{
    Json,
    extract::{RawQuery, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use foodgram_core::{RecipeId, RelationKind};

use super::{IdPath, json_body, query_pairs};
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{
    Page, PageRequest, RecipeChanges, RecipeDetail, RecipeDraft, RecipeFilter, RecipeSummary,
};
use crate::services::recipes::check_semantics;
use crate::services::{
    RecipeService, RelationService, RelationTarget, ShoppingListService, ToggleAction,
    UpdateSemantics,
};
use crate::state::AppState;

/// Download file name of the shopping list.
const SHOPPING_LIST_FILENAME: &str = "shopping_list.csv";

/// List recipes matching the query filters.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<RecipeDetail>>> {
    let pairs = query_pairs(query.as_deref());
    let page = PageRequest::from_query(&pairs, state.config().page_size)?;
    let filter = RecipeFilter::from_query(&pairs)?;

    let recipes = RecipeService::new(state.pool(), state.images())
        .list(filter, auth.actor(), page)
        .await?;
    Ok(Json(recipes))
}

/// Create a recipe authored by the caller.
#[instrument(skip_all, fields(user_id = %auth.actor()))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    payload: std::result::Result<Json<RecipeDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeDetail>)> {
    let draft = json_body(payload)?;
    let recipe = RecipeService::new(state.pool(), state.images())
        .create(auth.actor(), &draft)
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// One recipe as seen by the caller.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<Json<RecipeDetail>> {
    let recipe = RecipeService::new(state.pool(), state.images())
        .get(id, auth.actor())
        .await?;
    Ok(Json(recipe))
}

/// Partially update a recipe.
#[instrument(skip(state, auth, payload))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
    payload: std::result::Result<Json<RecipeChanges>, JsonRejection>,
) -> Result<Json<RecipeDetail>> {
    let changes = json_body(payload)?;
    let recipe = RecipeService::new(state.pool(), state.images())
        .update(auth.actor(), id, UpdateSemantics::Partial, &changes)
        .await?;
    Ok(Json(recipe))
}

/// Full replacement is not offered; always `405`, whatever the caller or body.
pub async fn replace() -> Result<StatusCode> {
    check_semantics(UpdateSemantics::FullReplace)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a recipe.
#[instrument(skip(state, auth))]
pub async fn destroy(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<StatusCode> {
    RecipeService::new(state.pool(), state.images())
        .delete(auth.actor(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relation(
    state: &AppState,
    auth: &RequireAuth,
    kind: RelationKind,
    id: RecipeId,
) -> Result<(StatusCode, Json<RecipeSummary>)> {
    let service = RelationService::new(state.pool(), state.images());
    service
        .toggle(
            auth.actor(),
            kind,
            RelationTarget::Recipe(id),
            ToggleAction::Add,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(service.recipe_summary(id).await?)))
}

async fn remove_relation(
    state: &AppState,
    auth: &RequireAuth,
    kind: RelationKind,
    id: RecipeId,
) -> Result<StatusCode> {
    RelationService::new(state.pool(), state.images())
        .toggle(
            auth.actor(),
            kind,
            RelationTarget::Recipe(id),
            ToggleAction::Remove,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to the caller's favorites.
#[instrument(skip(state, auth))]
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<(StatusCode, Json<RecipeSummary>)> {
    add_relation(&state, &auth, RelationKind::Favorite, id).await
}

/// Remove a recipe from the caller's favorites.
#[instrument(skip(state, auth))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<StatusCode> {
    remove_relation(&state, &auth, RelationKind::Favorite, id).await
}

/// Add a recipe to the caller's shopping list.
#[instrument(skip(state, auth))]
pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<(StatusCode, Json<RecipeSummary>)> {
    add_relation(&state, &auth, RelationKind::ShoppingCart, id).await
}

/// Remove a recipe from the caller's shopping list.
#[instrument(skip(state, auth))]
pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<RecipeId>,
) -> Result<StatusCode> {
    remove_relation(&state, &auth, RelationKind::ShoppingCart, id).await
}

/// The caller's aggregated shopping list as a CSV attachment.
#[instrument(skip_all, fields(user_id = %auth.actor()))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Response> {
    let csv = ShoppingListService::new(state.pool())
        .csv(auth.actor())
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
