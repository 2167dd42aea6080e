//! Tag handlers.

use axum::{Json, extract::State};

use foodgram_core::TagId;

use super::IdPath;
use crate::db::TagRepository;
use crate::error::{AppError, Result};
use crate::models::Tag;
use crate::state::AppState;

/// All tags, ordered by name.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(TagRepository::new(state.pool()).list().await?))
}

/// One tag.
pub async fn show(State(state): State<AppState>, IdPath(id): IdPath<TagId>) -> Result<Json<Tag>> {
    TagRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("tag".to_owned()))
}
