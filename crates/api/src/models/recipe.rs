//! Recipe domain types: write payloads and read representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use foodgram_core::{Amount, CookingTime, IngredientId, RecipeId, TagId};

use super::reference::Tag;
use super::user::UserView;

/// One ingredient line of a write payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: IngredientId,
    pub amount: Amount,
}

/// Payload for creating a recipe.
///
/// The author is never part of the payload; it comes from the caller.
/// `image` is a `data:image/<ext>;base64,...` URI.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: CookingTime,
    #[serde(default)]
    pub image: Option<String>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<TagId>,
}

/// Payload for a partial update.
///
/// An absent key leaves the field untouched. A present `ingredients` or
/// `tags` key replaces the whole association set. Explicit `null` is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeChanges {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub cooking_time: Option<CookingTime>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub ingredients: Option<Vec<IngredientAmount>>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Vec<TagId>>,
}

/// Deserialize a key that, when present, must carry a value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// An ingredient line of a recipe, as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: Amount,
}

/// Full recipe representation.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredient>,
    pub name: String,
    /// Image URL, resolved from the stored path before rendering.
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: CookingTime,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub pub_date: DateTime<Utc>,
}

/// Short recipe representation used by relation toggles and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: CookingTime,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_ignores_client_author() {
        let draft: RecipeDraft = serde_json::from_value(serde_json::json!({
            "author": 99,
            "name": "Pancakes",
            "text": "Mix and fry.",
            "cooking_time": 20,
            "ingredients": [{"id": 1, "amount": 200}],
            "tags": [1, 2]
        }))
        .unwrap();

        assert_eq!(draft.name, "Pancakes");
        assert!(draft.image.is_none());
        assert_eq!(draft.ingredients.len(), 1);
        assert_eq!(draft.tags, vec![TagId::new(1), TagId::new(2)]);
    }

    #[test]
    fn test_draft_rejects_zero_cooking_time() {
        let result = serde_json::from_value::<RecipeDraft>(serde_json::json!({
            "name": "Toast",
            "text": "Toast it.",
            "cooking_time": 0,
            "ingredients": [],
            "tags": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_changes_absent_keys_are_none() {
        let changes: RecipeChanges =
            serde_json::from_value(serde_json::json!({"name": "Renamed"})).unwrap();
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert!(changes.ingredients.is_none());
        assert!(changes.tags.is_none());
    }

    #[test]
    fn test_changes_present_empty_list_is_some() {
        let changes: RecipeChanges =
            serde_json::from_value(serde_json::json!({"tags": []})).unwrap();
        assert_eq!(changes.tags, Some(vec![]));
    }

    #[test]
    fn test_changes_reject_null() {
        let result = serde_json::from_value::<RecipeChanges>(serde_json::json!({"tags": null}));
        assert!(result.is_err());
    }
}
