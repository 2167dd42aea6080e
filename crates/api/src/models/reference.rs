//! Reference data: tags and ingredients.

use serde::Serialize;

use foodgram_core::{HexColor, IngredientId, Slug, TagId};

/// A recipe tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: Option<HexColor>,
    pub slug: Slug,
}

/// An ingredient with its measurement unit.
///
/// The same name may exist under several units ("salt, g" and "salt, pinch").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}
