//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `relations` - Favorite / shopping-cart / follow toggles and subscriptions
//! - `recipes` - Transactional recipe composition and filtered reads
//! - `shopping_list` - Shopping list aggregation and CSV rendering
//! - `images` - Inline image decoding and storage
//!
//! Every operation takes the acting user as an explicit argument.

pub mod auth;
pub mod images;
pub mod recipes;
pub mod relations;
pub mod shopping_list;

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::ValidationError;
use images::ImageError;

pub use recipes::{RecipeService, UpdateSemantics};
pub use relations::{RelationService, RelationTarget, ToggleAction};
pub use shopping_list::{ShoppingListItem, ShoppingListService};

/// Errors returned by the domain services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The relation (or value) already exists, or is absent on removal.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor may not perform this mutation.
    #[error("permission denied")]
    PermissionDenied,

    /// The operation is not offered for this HTTP method.
    #[error("method {0} not allowed")]
    MethodNotAllowed(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Image could not be decoded or stored.
    #[error("image error: {0}")]
    Image(#[from] ImageError),
}
