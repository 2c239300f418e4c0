//! Money type for representing monetary values.
//!
//! Storefront prices are whole rupees, so amounts are plain integers in
//! that unit. Arithmetic that could overflow goes through the checked
//! helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommerceError;

/// Currency symbol used when formatting amounts.
pub const CURRENCY_SYMBOL: &str = "\u{20b9}";

/// A non-negative monetary amount in whole rupees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create a Money value from a whole-rupee amount.
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// The raw amount.
    pub fn amount(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiply by a quantity, failing on overflow.
    pub fn try_multiply(&self, quantity: i64) -> Result<Money, CommerceError> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or(CommerceError::Overflow)
    }

    /// Add another amount, failing on overflow.
    pub fn try_add(&self, other: Money) -> Result<Money, CommerceError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CommerceError::Overflow)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn try_sum(iter: impl IntoIterator<Item = Money>) -> Result<Money, CommerceError> {
        iter.into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.try_add(m))
    }

    /// Format as a display string (e.g., "₹40").
    pub fn display(&self) -> String {
        format!("{CURRENCY_SYMBOL}{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(40).display(), "\u{20b9}40");
        assert_eq!(Money::new(40).to_string(), "\u{20b9}40");
    }

    #[test]
    fn test_money_multiply() {
        assert_eq!(Money::new(20).try_multiply(2).unwrap(), Money::new(40));
        assert!(matches!(
            Money::new(i64::MAX).try_multiply(2),
            Err(CommerceError::Overflow)
        ));
    }

    #[test]
    fn test_money_sum() {
        let total = Money::try_sum([Money::new(40), Money::new(15), Money::new(5)]).unwrap();
        assert_eq!(total, Money::new(60));
        assert_eq!(Money::try_sum([]).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_money_sum_overflow() {
        let result = Money::try_sum([Money::new(i64::MAX), Money::new(1)]);
        assert!(matches!(result, Err(CommerceError::Overflow)));
    }
}
