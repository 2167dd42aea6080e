//! Ingredient handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use foodgram_core::IngredientId;

use super::IdPath;
use crate::db::IngredientRepository;
use crate::error::{AppError, Result};
use crate::models::Ingredient;
use crate::state::AppState;

/// Ingredient search parameters.
#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name fragment; prefix matches rank first.
    pub name: Option<String>,
}

/// Search ingredients by name.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>> {
    let ingredients = IngredientRepository::new(state.pool())
        .search(query.name.as_deref())
        .await?;
    Ok(Json(ingredients))
}

/// One ingredient.
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<IngredientId>,
) -> Result<Json<Ingredient>> {
    IngredientRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("ingredient".to_owned()))
}
