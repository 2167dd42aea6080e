//! Read-time filters over the recipe collection.
//!
//! ```text
//! GET /api/recipes?author=3&tags=breakfast&tags=lunch&is_favorited=1&is_in_shopping_cart=0
//! ```
//!
//! Tags combine with OR. The favorites and shopping-cart flags need a caller;
//! for anonymous requests they are dropped rather than rejected.

use foodgram_core::{Slug, UserId};

use crate::error::ValidationError;

/// Recipe list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Only recipes by this author.
    pub author: Option<UserId>,
    /// Only recipes carrying any of these tag slugs.
    pub tags: Vec<Slug>,
    /// Only recipes in the caller's favorites.
    pub is_favorited: bool,
    /// Only recipes in the caller's shopping list.
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    /// Read filters from query pairs. Repeated `tags` keys accumulate.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending parameter.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, ValidationError> {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "author" => {
                    let author = value
                        .parse::<UserId>()
                        .map_err(|_| ValidationError::new("author", "must be a user id"))?;
                    filter.author = Some(author);
                }
                "tags" => {
                    let slug = Slug::parse(value)
                        .map_err(|e| ValidationError::new("tags", e.to_string()))?;
                    if !filter.tags.contains(&slug) {
                        filter.tags.push(slug);
                    }
                }
                "is_favorited" => filter.is_favorited = parse_flag("is_favorited", value)?,
                "is_in_shopping_cart" => {
                    filter.is_in_shopping_cart = parse_flag("is_in_shopping_cart", value)?;
                }
                _ => {}
            }
        }
        Ok(filter)
    }

    /// The filter as applied for `actor`: caller-relative flags are ignored
    /// for anonymous callers.
    #[must_use]
    pub fn for_actor(mut self, actor: Option<UserId>) -> Self {
        if actor.is_none() {
            self.is_favorited = false;
            self.is_in_shopping_cart = false;
        }
        self
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(ValidationError::new(field, "must be 0, 1, true or false")),
    }
}
