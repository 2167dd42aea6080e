//! User repository for database operations.
//!
//! Users are listed together with the caller-relative `is_subscribed` flag,
//! computed in the same query from the `follow` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use foodgram_core::{Email, UserId, Username};

use super::RepositoryError;
use crate::models::{PageRequest, User, UserView};

/// Raw `foodgram.user` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            username,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        })
    }
}

/// A user row with the caller-relative subscription flag.
#[derive(Debug, sqlx::FromRow)]
struct UserViewRow {
    #[sqlx(flatten)]
    user: UserRow,
    is_subscribed: bool,
}

impl TryFrom<UserViewRow> for UserView {
    type Error = RepositoryError;

    fn try_from(row: UserViewRow) -> Result<Self, Self::Error> {
        Ok(User::try_from(row.user)?.into_view(row.is_subscribed))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Fields stored for a new account.
#[derive(Debug, Clone, Copy)]
pub struct NewUserRecord<'a> {
    pub email: &'a Email,
    pub username: &'a Username,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored values are invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, username, first_name, last_name, created_at
            FROM foodgram.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user's public view as seen by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_view(
        &self,
        id: UserId,
        actor: Option<UserId>,
    ) -> Result<Option<UserView>, RepositoryError> {
        let row = sqlx::query_as::<_, UserViewRow>(
            r"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.created_at,
                   EXISTS (
                       SELECT 1 FROM foodgram.follow f
                       WHERE f.user_id = $2 AND f.following_id = u.id
                   ) AS is_subscribed
            FROM foodgram.user u
            WHERE u.id = $1
            ",
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserView::try_from).transpose()
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, username, first_name, last_name, created_at, password_hash
            FROM foodgram.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` with the violated constraint name
    /// (`user_email_unique` or `user_username_unique`) on a duplicate.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewUserRecord<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO foodgram.user (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, first_name, last_name, created_at
            ",
        )
        .bind(new.email.as_str())
        .bind(new.username.as_str())
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        User::try_from(row)
    }

    /// List users by id, one page at a time, as seen by `actor`.
    ///
    /// Returns the page and the total number of users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        actor: Option<UserId>,
        page: PageRequest,
    ) -> Result<(Vec<UserView>, i64), RepositoryError> {
        let rows = sqlx::query_as::<_, UserViewRow>(
            r"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.created_at,
                   EXISTS (
                       SELECT 1 FROM foodgram.follow f
                       WHERE f.user_id = $1 AND f.following_id = u.id
                   ) AS is_subscribed
            FROM foodgram.user u
            ORDER BY u.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(actor)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foodgram.user")
            .fetch_one(self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(UserView::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, count))
    }
}
