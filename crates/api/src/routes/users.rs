//! User, registration and subscription handlers.

use axum::{
    Json,
    extract::{RawQuery, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use foodgram_core::{RelationKind, UserId};

use super::{IdPath, json_body, query_pairs};
use crate::db::UserRepository;
use crate::error::{AppError, Result, ValidationError};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{NewUser, Page, PageRequest, SubscriptionView, UserView};
use crate::services::auth::AuthService;
use crate::services::{RelationService, RelationTarget, ToggleAction};
use crate::state::AppState;

/// Read the optional `recipes_limit` query parameter.
fn recipes_limit(pairs: &[(String, String)]) -> std::result::Result<Option<i64>, ValidationError> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == "recipes_limit")
        .map(|(_, value)| {
            value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|limit| *limit >= 0)
                .ok_or_else(|| {
                    ValidationError::new("recipes_limit", "must be a non-negative integer")
                })
        })
        .transpose()
}

/// Register a new user.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>)> {
    let new = json_body(payload)?;
    let user = AuthService::new(state.pool()).register(&new).await?;
    Ok((StatusCode::CREATED, Json(user.into_view(false))))
}

/// List users, one page at a time.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<UserView>>> {
    let pairs = query_pairs(query.as_deref());
    let page = PageRequest::from_query(&pairs, state.config().page_size)?;

    let (users, count) = UserRepository::new(state.pool())
        .list(auth.actor(), page)
        .await?;
    Ok(Json(Page::new(users, count, page)))
}

/// The current user.
#[instrument(skip_all, fields(user_id = %auth.actor()))]
pub async fn me(State(state): State<AppState>, auth: RequireAuth) -> Result<Json<UserView>> {
    let actor = auth.actor();
    UserRepository::new(state.pool())
        .get_view(actor, Some(actor))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("user".to_owned()))
}

/// One user as seen by the caller.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<UserView>> {
    UserRepository::new(state.pool())
        .get_view(id, auth.actor())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("user".to_owned()))
}

/// Users the caller follows, each with their newest recipes.
#[instrument(skip_all, fields(user_id = %auth.actor()))]
pub async fn subscriptions(
    State(state): State<AppState>,
    auth: RequireAuth,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<SubscriptionView>>> {
    let pairs = query_pairs(query.as_deref());
    let page = PageRequest::from_query(&pairs, state.config().page_size)?;
    let limit = recipes_limit(&pairs)?;

    let subscriptions = RelationService::new(state.pool(), state.images())
        .subscriptions(auth.actor(), page, limit)
        .await?;
    Ok(Json(subscriptions))
}

/// Follow a user.
#[instrument(skip(state, auth, query))]
pub async fn subscribe(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<UserId>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<SubscriptionView>)> {
    let limit = recipes_limit(&query_pairs(query.as_deref()))?;
    let service = RelationService::new(state.pool(), state.images());

    service
        .toggle(
            auth.actor(),
            RelationKind::Follow,
            RelationTarget::User(id),
            ToggleAction::Add,
        )
        .await?;

    let view = service.subscription(auth.actor(), id, limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Stop following a user.
#[instrument(skip(state, auth))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: RequireAuth,
    IdPath(id): IdPath<UserId>,
) -> Result<StatusCode> {
    RelationService::new(state.pool(), state.images())
        .toggle(
            auth.actor(),
            RelationKind::Follow,
            RelationTarget::User(id),
            ToggleAction::Remove,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
