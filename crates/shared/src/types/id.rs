//! Wallet identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing a [`WalletId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value is not an integer.
    #[error("wallet id is not an integer: {0}")]
    Malformed(String),

    /// The value is zero or negative.
    #[error("wallet id must be positive, got {0}")]
    NotPositive(i64),
}

/// Opaque positive integer identifying a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct WalletId(i64);

impl WalletId {
    /// Creates a wallet id, returning `None` for non-positive values.
    #[must_use]
    pub const fn new(id: i64) -> Option<Self> {
        if id > 0 { Some(Self(id)) } else { None }
    }

    /// Returns the raw integer.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for WalletId {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(IdError::NotPositive(value))
    }
}

impl From<WalletId> for i64 {
    fn from(id: WalletId) -> Self {
        id.0
    }
}

impl FromStr for WalletId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| IdError::Malformed(s.to_string()))?;
        Self::try_from(raw)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
