//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Every error body has the same shape:
//!
//! ```json
//! {"errors": {"ingredients": ["ingredient 7 is listed more than once"]}}
//! {"errors": {"detail": ["recipe is already in favorites"]}}
//! ```

use axum::{
    Json,
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;
use crate::services::auth::AuthError;
use crate::services::images::ImageError;

/// Key used for errors that do not belong to a single input field.
pub const NON_FIELD_KEY: &str = "detail";

/// Malformed or inconsistent input, reported against the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Input field (or query parameter) the error refers to.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A relation or unique value already exists, or a relation to remove is absent.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller may not mutate this resource.
    #[error("Permission denied")]
    PermissionDenied,

    /// Caller is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// HTTP method not supported on this resource.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => Self::Validation(e),
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            ServiceError::PermissionDenied => Self::PermissionDenied,
            ServiceError::MethodNotAllowed(method) => Self::MethodNotAllowed(method.to_owned()),
            ServiceError::Repository(RepositoryError::NotFound) => {
                Self::NotFound("referenced object does not exist".to_owned())
            }
            ServiceError::Repository(RepositoryError::Conflict(constraint)) => {
                Self::Conflict(format!("violates {constraint}"))
            }
            ServiceError::Repository(e) => Self::Database(e),
            ServiceError::Image(e @ ImageError::Io(_)) => Self::Internal(e.to_string()),
            ServiceError::Image(e) => Self::Validation(ValidationError::new("image", e.to_string())),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(ValidationError::new(NON_FIELD_KEY, rejection.body_text()))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Validation(ValidationError::new(
                NON_FIELD_KEY,
                "unable to log in with provided credentials",
            )),
            AuthError::WeakPassword(msg) => Self::Validation(ValidationError::new("password", msg)),
            AuthError::AlreadyTaken(field) => {
                Self::Conflict(format!("a user with this {field} already exists"))
            }
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_owned()),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let (field, message) = match self {
            Self::Validation(e) => (e.field, e.message),
            Self::Conflict(msg) => (NON_FIELD_KEY.to_owned(), msg),
            Self::NotFound(what) => (NON_FIELD_KEY.to_owned(), format!("not found: {what}")),
            Self::PermissionDenied => (
                NON_FIELD_KEY.to_owned(),
                "you do not have permission to perform this action".to_owned(),
            ),
            Self::Unauthorized => (
                NON_FIELD_KEY.to_owned(),
                "authentication credentials were not provided".to_owned(),
            ),
            Self::MethodNotAllowed(method) => (
                NON_FIELD_KEY.to_owned(),
                format!("method \"{method}\" not allowed"),
            ),
            Self::Database(_) | Self::Internal(_) => {
                (NON_FIELD_KEY.to_owned(), "internal server error".to_owned())
            }
        };

        (status, Json(json!({ "errors": { field: [message] } }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("recipe 123".to_string());
        assert_eq!(err.to_string(), "Not found: recipe 123");

        let err = AppError::Validation(ValidationError::new("tags", "duplicate tag 3"));
        assert_eq!(err.to_string(), "Validation error: tags: duplicate tag 3");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation(ValidationError::new("name", "x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::MethodNotAllowed("PUT".into()).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_names_field() {
        let (status, body) = body_json(AppError::Validation(ValidationError::new(
            "ingredients",
            "ingredient 7 is listed more than once",
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"errors": {"ingredients": ["ingredient 7 is listed more than once"]}})
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (_, body) = body_json(AppError::Internal("disk on fire".into())).await;
        assert_eq!(body, json!({"errors": {"detail": ["internal server error"]}}));
    }

    #[test]
    fn test_service_error_mapping() {
        assert!(matches!(
            AppError::from(ServiceError::Repository(RepositoryError::Conflict(
                "favorite_unique".into()
            ))),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::Repository(RepositoryError::NotFound)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::Image(ImageError::InvalidDataUri)),
            AppError::Validation(ValidationError { ref field, .. }) if field == "image"
        ));
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            AppError::from(AuthError::AlreadyTaken("email")),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::WeakPassword("too short".into())),
            AppError::Validation(ValidationError { ref field, .. }) if field == "password"
        ));
    }
}
