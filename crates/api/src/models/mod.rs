//! Domain models and API representations.
//!
//! Each representation is a fixed field projection with its own struct; the
//! same user is rendered as [`UserView`] inside a recipe and as
//! [`SubscriptionView`] in the subscriptions list.

pub mod filter;
pub mod pagination;
pub mod recipe;
pub mod reference;
pub mod session;
pub mod user;

pub use filter::RecipeFilter;
pub use pagination::{Page, PageRequest};
pub use recipe::{
    IngredientAmount, RecipeChanges, RecipeDetail, RecipeDraft, RecipeIngredient, RecipeSummary,
};
pub use reference::{Ingredient, Tag};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, SubscriptionView, User, UserView};
