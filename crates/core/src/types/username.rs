//! Usernames and personal names.
//!
//! Usernames follow the usual web-account rules: letters, digits and
//! `.@+-_`, at most 150 characters. The name `me` is reserved because
//! `/api/users/me` addresses the caller.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`] or [`PersonName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is empty after trimming.
    #[error("cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("contains forbidden character {0:?}")]
    InvalidCharacter(char),
    /// The username is reserved for routing.
    #[error("username {0:?} is reserved")]
    Reserved(String),
}

/// Reserved usernames.
const RESERVED: &[&str] = &["me"];

/// A validated, unique account name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 150;

    /// Parse a `Username`.
    ///
    /// # Errors
    ///
    /// Returns a [`UsernameError`] if the name is empty, too long, reserved,
    /// or contains a character other than a letter, digit or `.@+-_`.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_')))
        {
            return Err(UsernameError::InvalidCharacter(c));
        }
        if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(s)) {
            return Err(UsernameError::Reserved(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

/// A first or last name: free text, trimmed, 1-150 characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Maximum length of a first or last name.
    pub const MAX_LENGTH: usize = 150;

    /// Parse a `PersonName`.
    ///
    /// # Errors
    ///
    /// Returns [`UsernameError::Empty`] or [`UsernameError::TooLong`].
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PersonName> for String {
    fn from(name: PersonName) -> Self {
        name.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(Username::parse("vasya").is_ok());
        assert!(Username::parse("chef.anna+blog@home").is_ok());
        assert!(Username::parse("повар_42").is_ok());
    }

    #[test]
    fn test_username_trims() {
        assert_eq!(Username::parse("  cook ").unwrap().as_str(), "cook");
    }

    #[test]
    fn test_username_rejects_forbidden_characters() {
        assert_eq!(
            Username::parse("bad name"),
            Err(UsernameError::InvalidCharacter(' '))
        );
        assert_eq!(
            Username::parse("semi;colon"),
            Err(UsernameError::InvalidCharacter(';'))
        );
    }

    #[test]
    fn test_username_reserved() {
        assert!(matches!(
            Username::parse("me"),
            Err(UsernameError::Reserved(_))
        ));
        assert!(matches!(
            Username::parse("ME"),
            Err(UsernameError::Reserved(_))
        ));
    }

    #[test]
    fn test_username_length() {
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
        assert!(Username::parse(&"a".repeat(150)).is_ok());
        assert!(matches!(
            Username::parse(&"a".repeat(151)),
            Err(UsernameError::TooLong { max: 150 })
        ));
    }

    #[test]
    fn test_person_name() {
        assert_eq!(PersonName::parse(" Anna ").unwrap().as_str(), "Anna");
        assert_eq!(PersonName::parse("   "), Err(UsernameError::Empty));
    }
}
