//! User domain types and representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodgram_core::{Email, PersonName, UserId, Username};

use super::recipe::RecipeSummary;

/// A registered user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique email address.
    pub email: Email,
    /// Unique account name.
    pub username: Username,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Project into the public representation.
    #[must_use]
    pub fn into_view(self, is_subscribed: bool) -> UserView {
        UserView {
            email: self.email,
            id: self.id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            is_subscribed,
        }
    }
}

/// Registration payload.
///
/// Every field is validated during deserialization except the password,
/// whose strength rules live in the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: Email,
    pub username: Username,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub password: String,
}

/// Public user representation.
///
/// `is_subscribed` is whether the caller follows this user; always `false`
/// for anonymous callers.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: Email,
    pub id: UserId,
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// A followed user with their recipes, as listed under subscriptions.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    /// Total number of recipes the user authored.
    pub recipes_count: i64,
    /// Newest recipes first, possibly truncated by `recipes_limit`.
    pub recipes: Vec<RecipeSummary>,
}
