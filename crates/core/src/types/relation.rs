//! Kinds of user-owned relations that can be toggled on and off.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A uniqueness-constrained join between a user and a target.
///
/// `Favorite` and `ShoppingCart` target a recipe; `Follow` targets another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The user marked the recipe as a favorite.
    Favorite,
    /// The recipe is in the user's shopping list.
    ShoppingCart,
    /// The user follows another user.
    Follow,
}

impl RelationKind {
    /// All relation kinds.
    pub const ALL: [Self; 3] = [Self::Favorite, Self::ShoppingCart, Self::Follow];

    /// Whether the relation's target is a user rather than a recipe.
    #[must_use]
    pub const fn targets_user(self) -> bool {
        matches!(self, Self::Follow)
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Favorite => "recipe in favorites",
            Self::ShoppingCart => "recipe in shopping cart",
            Self::Follow => "subscription",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Favorite => "favorite",
            Self::ShoppingCart => "shopping_cart",
            Self::Follow => "follow",
        })
    }
}
