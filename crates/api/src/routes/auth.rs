//! Session login and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use foodgram_core::Email;

use super::json_body;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, UserView};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Email,
    pub password: String,
}

/// Log in with email and password, storing the user in the session.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserView>> {
    let request = json_body(payload)?;

    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            username: user.username.clone(),
        },
    )
    .await
    .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.username.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(user.into_view(false)))
}

/// End the current session.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(RequireAuth(user): RequireAuth, session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    clear_sentry_user();
    tracing::info!("User logged out");

    Ok(StatusCode::NO_CONTENT)
}
