//! Tag value types: URL slugs and hex color codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`] or [`HexColor`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TagValueError {
    /// The slug is empty.
    #[error("slug cannot be empty")]
    EmptySlug,
    /// The slug is too long.
    #[error("slug must be at most {max} characters")]
    SlugTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains a character that is not URL-safe.
    #[error("slug contains forbidden character {0:?}")]
    SlugCharacter(char),
    /// The color is not `#` followed by six hex digits.
    #[error("color must be '#' followed by six hex digits, got {0:?}")]
    Color(String),
}

/// A URL-safe tag identifier: ASCII letters, digits, `-` and `_`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 200;

    /// Parse a `Slug`.
    ///
    /// # Errors
    ///
    /// Returns a [`TagValueError`] if the slug is empty, too long, or not URL-safe.
    pub fn parse(s: &str) -> Result<Self, TagValueError> {
        if s.is_empty() {
            return Err(TagValueError::EmptySlug);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TagValueError::SlugTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
        {
            return Err(TagValueError::SlugCharacter(c));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = TagValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// A `#RRGGBB` color code, stored uppercase.
///
/// ```
/// use foodgram_core::HexColor;
///
/// assert_eq!(HexColor::parse("#e26c2d").unwrap().as_str(), "#E26C2D");
/// assert!(HexColor::parse("e26c2d").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `HexColor`.
    ///
    /// # Errors
    ///
    /// Returns [`TagValueError::Color`] unless the input is `#` plus six hex digits.
    pub fn parse(s: &str) -> Result<Self, TagValueError> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| TagValueError::Color(s.to_owned()))?;
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    /// Returns the color code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = TagValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_valid() {
        assert_eq!(Slug::parse("breakfast").unwrap().as_str(), "breakfast");
        assert!(Slug::parse("late_night-snack2").is_ok());
    }

    #[test]
    fn test_slug_invalid() {
        assert_eq!(Slug::parse(""), Err(TagValueError::EmptySlug));
        assert_eq!(
            Slug::parse("with space"),
            Err(TagValueError::SlugCharacter(' '))
        );
        assert_eq!(Slug::parse("завтрак"), Err(TagValueError::SlugCharacter('з')));
        assert!(matches!(
            Slug::parse(&"a".repeat(201)),
            Err(TagValueError::SlugTooLong { .. })
        ));
    }

    #[test]
    fn test_color_valid() {
        assert_eq!(HexColor::parse("#49B64E").unwrap().as_str(), "#49B64E");
        assert_eq!(HexColor::parse("#abcdef").unwrap().as_str(), "#ABCDEF");
    }

    #[test]
    fn test_color_invalid() {
        for bad in ["", "#", "#12345", "#1234567", "123456", "#GGGGGG"] {
            assert!(HexColor::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_color_deserialize_validates() {
        assert!(serde_json::from_str::<HexColor>("\"#E26C2D\"").is_ok());
        assert!(serde_json::from_str::<HexColor>("\"red\"").is_err());
    }
}
