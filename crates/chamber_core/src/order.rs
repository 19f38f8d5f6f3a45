//! Order identifiers.
//!
//! An order id is assigned once per logical tuple by the source stage that
//! first produces it, and travels unchanged with every tuple derived from
//! it. Stages with several inputs pair values that carry equal order ids.

use serde::{Deserialize, Serialize};

/// Order identifier - correlates the values of one upstream tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OrderId(u64);

impl OrderId {
    /// The first order id a source hands out
    pub const ZERO: Self = Self(0);

    /// Create from a raw counter value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The id following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Distance from `base` to `self`, or `None` if `self` precedes `base`
    #[must_use]
    pub fn offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    /// Advance by `n` positions
    #[must_use]
    pub const fn advance(self, n: u64) -> Self {
        Self(self.0 + n)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
