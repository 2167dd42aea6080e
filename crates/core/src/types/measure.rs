//! Quantities attached to recipes: cooking time and ingredient amounts.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`CookingTime`] or [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MeasureError {
    /// Cooking time below one minute.
    #[error("cooking time must be at least {min} minute")]
    CookingTimeTooShort {
        /// Minimum allowed minutes.
        min: i32,
    },
    /// Cooking time above the storable maximum.
    #[error("cooking time must be at most {max} minutes")]
    CookingTimeTooLong {
        /// Maximum allowed minutes.
        max: i32,
    },
    /// Amount is zero or negative.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    /// Amount does not fit `NUMERIC(10, 3)`.
    #[error("amount must have at most {max_integer_digits} integer and {max_scale} fractional digits")]
    AmountPrecision {
        /// Maximum digits before the decimal point.
        max_integer_digits: u32,
        /// Maximum digits after the decimal point.
        max_scale: u32,
    },
}

/// Cooking time in whole minutes, `1..=32767`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CookingTime(i32);

impl CookingTime {
    /// Shortest allowed cooking time.
    pub const MIN_MINUTES: i32 = 1;
    /// Longest allowed cooking time (fits a `SMALLINT`).
    pub const MAX_MINUTES: i32 = i16::MAX as i32;

    /// Create a cooking time from minutes.
    ///
    /// # Errors
    ///
    /// Returns a [`MeasureError`] when `minutes` is outside `1..=32767`.
    pub const fn new(minutes: i32) -> Result<Self, MeasureError> {
        if minutes < Self::MIN_MINUTES {
            return Err(MeasureError::CookingTimeTooShort {
                min: Self::MIN_MINUTES,
            });
        }
        if minutes > Self::MAX_MINUTES {
            return Err(MeasureError::CookingTimeTooLong {
                max: Self::MAX_MINUTES,
            });
        }
        Ok(Self(minutes))
    }

    /// Minutes as `i32`.
    #[must_use]
    pub const fn minutes(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for CookingTime {
    type Error = MeasureError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CookingTime> for i32 {
    fn from(value: CookingTime) -> Self {
        value.0
    }
}

/// A positive ingredient amount, stored as `NUMERIC(10, 3)`.
///
/// Amounts are summed across recipes for the shopping list, so they are kept
/// as decimals rather than floats: `0.1 + 0.2` must print as `0.3`.
///
/// Serialized as a JSON number; deserialized from a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Maximum fractional digits.
    pub const MAX_SCALE: u32 = 3;
    /// Maximum integer digits.
    pub const MAX_INTEGER_DIGITS: u32 = 7;

    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::NonPositiveAmount`] for zero or negative values,
    /// and [`MeasureError::AmountPrecision`] for values that do not fit the column.
    pub fn new(value: Decimal) -> Result<Self, MeasureError> {
        if value <= Decimal::ZERO {
            return Err(MeasureError::NonPositiveAmount);
        }
        let value = value.normalize();
        let limit = Decimal::from(10_i64.pow(Self::MAX_INTEGER_DIGITS));
        if value.scale() > Self::MAX_SCALE || value >= limit {
            return Err(MeasureError::AmountPrecision {
                max_integer_digits: Self::MAX_INTEGER_DIGITS,
                max_scale: Self::MAX_SCALE,
            });
        }
        Ok(Self(value))
    }

    /// Wrap a decimal read back from storage or produced by summation.
    ///
    /// No range check: sums of valid amounts may exceed a single column value.
    #[must_use]
    pub fn from_total(value: Decimal) -> Self {
        Self(value.normalize())
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl core::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_total(self.0 + rhs.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0.normalize();
        if value.scale() == 0
            && let Some(whole) = value.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(value.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
