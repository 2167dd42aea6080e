//! Integration test support for Foodgram.
//!
//! # Running Tests
//!
//! ```bash
//! # Router tests only (no database needed)
//! cargo test -p foodgram-integration-tests
//!
//! # Including database-backed tests
//! FOODGRAM_TEST_DATABASE_URL=postgres://localhost/foodgram_test \
//!     cargo test -p foodgram-integration-tests
//! ```
//!
//! Database-backed tests return early when `FOODGRAM_TEST_DATABASE_URL` is
//! unset. Every fixture gets a unique name, so tests share one database and
//! never clean up after each other.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use foodgram_api::config::ApiConfig;
use foodgram_api::db::MIGRATOR;
use foodgram_api::middleware::session::session_layer;
use foodgram_api::models::{IngredientAmount, NewUser, RecipeDraft};
use foodgram_api::services::auth::AuthService;
use foodgram_api::services::images::ImageStore;
use foodgram_api::state::AppState;
use foodgram_core::{
    Amount, CookingTime, Email, IngredientId, PersonName, TagId, UserId, Username,
};

/// Environment variable naming the test database.
pub const TEST_DATABASE_ENV: &str = "FOODGRAM_TEST_DATABASE_URL";

/// A short unique suffix for fixture names.
#[must_use]
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

/// Configuration pointing at `database_url`, with media under a temp dir.
#[must_use]
pub fn test_config(database_url: &str) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from(database_url.to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 8000,
        base_url: "http://localhost:8000".to_owned(),
        media_root: std::env::temp_dir().join(format!("foodgram-media-{}", unique())),
        media_url: "/media".to_owned(),
        page_size: 6,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Full application router over a pool that never connects.
///
/// Suitable for properties decided before any query runs.
#[must_use]
pub fn offline_app() -> Router {
    let url = "postgres://foodgram@127.0.0.1:1/foodgram_offline";
    let pool = PgPoolOptions::new().connect_lazy(url).unwrap();
    let state = AppState::new(test_config(url), pool);
    foodgram_api::app(state, session_layer(MemoryStore::default(), false))
}

/// Connect to the test database and apply migrations, or `None` when no test
/// database is configured.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var(TEST_DATABASE_ENV).ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    Some(pool)
}

/// Image store under a fresh temp directory.
#[must_use]
pub fn test_images() -> ImageStore {
    ImageStore::new(
        std::env::temp_dir().join(format!("foodgram-media-{}", unique())),
        "/media",
    )
}

/// Register a user with a unique username and email.
pub async fn create_user(pool: &PgPool) -> UserId {
    let suffix = unique();
    let new = NewUser {
        email: Email::parse(&format!("cook-{suffix}@example.com")).unwrap(),
        username: Username::parse(&format!("cook_{suffix}")).unwrap(),
        first_name: PersonName::parse("Test").unwrap(),
        last_name: PersonName::parse("Cook").unwrap(),
        password: "correct horse battery".to_owned(),
    };
    AuthService::new(pool).register(&new).await.unwrap().id
}

/// Insert a tag with a unique slug.
pub async fn create_tag(pool: &PgPool) -> (TagId, String) {
    let slug = format!("tag-{}", unique());
    let id = sqlx::query_scalar::<_, TagId>(
        "INSERT INTO foodgram.tag (name, slug) VALUES ($1, $1) RETURNING id",
    )
    .bind(&slug)
    .fetch_one(pool)
    .await
    .unwrap();
    (id, slug)
}

/// Insert an ingredient with the given name (made unique) and unit.
pub async fn create_ingredient(pool: &PgPool, name: &str, unit: &str) -> (IngredientId, String) {
    let name = format!("{name}-{}", unique());
    let id = sqlx::query_scalar::<_, IngredientId>(
        "INSERT INTO foodgram.ingredient (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(&name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .unwrap();
    (id, name)
}

/// An ingredient line.
#[must_use]
pub fn line(id: IngredientId, amount: i64) -> IngredientAmount {
    IngredientAmount {
        id,
        amount: Amount::new(Decimal::from(amount)).unwrap(),
    }
}

/// A valid recipe draft.
#[must_use]
pub fn draft(name: &str, ingredients: Vec<IngredientAmount>, tags: Vec<TagId>) -> RecipeDraft {
    RecipeDraft {
        name: name.to_owned(),
        text: "Mix everything.".to_owned(),
        cooking_time: CookingTime::new(15).unwrap(),
        image: None,
        ingredients,
        tags,
    }
}
