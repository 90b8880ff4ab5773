//! Fixed-point money type.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and is persisted and transmitted
//! as an integer number of minor units (amount x 1000).

use std::fmt;
use std::ops::{Add, Sub};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of fractional digits kept by [`Money`].
pub const SCALE: u32 = 3;

/// Minor units per whole unit (`10^SCALE`).
pub const MINOR_UNITS_PER_UNIT: i64 = 1_000;

/// Errors raised when converting money to its integer representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount does not fit into an `i64` number of minor units.
    #[error("amount {0} does not fit into minor units")]
    OutOfRange(Decimal),
}

/// An exact monetary amount with three fractional digits.
///
/// Equality and ordering follow decimal value semantics, so `1.5` and
/// `1.500` compare equal.
///
/// Values beyond what `Decimal` can represent (a 96-bit mantissa) are out of
/// scope; arithmetic at that magnitude panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Creates money from an integer number of minor units.
    #[must_use]
    pub fn from_minor_units(minor: i64) -> Self {
        Self(Decimal::new(minor, SCALE))
    }

    /// Wraps an existing decimal value.
    #[must_use]
    pub const fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Zero money.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Converts to integer minor units, truncating digits past [`SCALE`].
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        self.0
            .trunc_with_scale(SCALE)
            .checked_mul(Decimal::from(MINOR_UNITS_PER_UNIT))
            .and_then(|minor| minor.trunc().to_i64())
            .ok_or(MoneyError::OutOfRange(self.0))
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        value.rescale(SCALE);
        write!(f, "{value}")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let minor = self
            .to_minor_units()
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_i64(minor)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_minor_units)
    }
}
