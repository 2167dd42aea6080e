//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! All routes are nested under `/api`.
//!
//! ```text
//! # Auth
//! POST   /auth/login                       - Start a session
//! POST   /auth/logout                      - End the session
//!
//! # Users
//! GET    /users                            - User listing (paginated)
//! POST   /users                            - Register
//! GET    /users/me                         - Current user (auth)
//! GET    /users/subscriptions              - Followed users with recipes (auth)
//! GET    /users/{id}                       - User detail
//! POST   /users/{id}/subscribe             - Follow (auth)
//! DELETE /users/{id}/subscribe             - Unfollow (auth)
//!
//! # Recipes
//! GET    /recipes                          - Filtered listing (paginated)
//! POST   /recipes                          - Create (auth)
//! GET    /recipes/download_shopping_cart   - Shopping list as CSV (auth)
//! GET    /recipes/{id}                     - Recipe detail
//! PATCH  /recipes/{id}                     - Partial update (author)
//! PUT    /recipes/{id}                     - Always 405
//! DELETE /recipes/{id}                     - Delete (author)
//! POST   /recipes/{id}/favorite            - Add to favorites (auth)
//! DELETE /recipes/{id}/favorite            - Remove from favorites (auth)
//! POST   /recipes/{id}/shopping_cart       - Add to shopping list (auth)
//! DELETE /recipes/{id}/shopping_cart       - Remove from shopping list (auth)
//!
//! # Reference data
//! GET    /tags, /tags/{id}
//! GET    /ingredients?name=, /ingredients/{id}
//! ```

pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use axum::{
    Json, Router,
    extract::{FromRequestParts, rejection::JsonRejection},
    routing::{get, post},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, NON_FIELD_KEY, ValidationError};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::register))
        .route("/me", get(users::me))
        .route("/subscriptions", get(users::subscriptions))
        .route("/{id}", get(users::show))
        .route(
            "/{id}/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
}

/// Create the recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(recipes::index).post(recipes::create))
        .route("/download_shopping_cart", get(recipes::download_shopping_cart))
        .route(
            "/{id}",
            get(recipes::show)
                .patch(recipes::update)
                .put(recipes::replace)
                .delete(recipes::destroy),
        )
        .route(
            "/{id}/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/{id}/shopping_cart",
            post(recipes::add_to_shopping_cart).delete(recipes::remove_from_shopping_cart),
        )
}

/// Create the reference data routes router.
pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(tags::index))
        .route("/tags/{id}", get(tags::show))
        .route("/ingredients", get(ingredients::index))
        .route("/ingredients/{id}", get(ingredients::show))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/recipes", recipe_routes())
        .merge(reference_routes())
}

/// Unwrap a JSON body, reporting a malformed one in the API's error shape.
pub(crate) fn json_body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ValidationError::new(NON_FIELD_KEY, rejection.body_text()).into())
}

/// Typed path id whose parse failures use the API's error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct IdPath<T>(pub T);

/// Decode a raw query string into key/value pairs, keeping repeated keys.
pub(crate) fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}
