//! Core types for Foodgram.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod measure;
pub mod relation;
pub mod tag;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use measure::{Amount, CookingTime, MeasureError};
pub use relation::RelationKind;
pub use tag::{HexColor, Slug, TagValueError};
pub use username::{PersonName, Username, UsernameError};
