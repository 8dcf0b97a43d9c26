//! Monetary amounts with decimal arithmetic.
//!
//! The three upstreams disagree on representation: the WooCommerce Store API
//! sends minor-unit strings plus a `currency_minor_unit` exponent, the
//! WooCommerce v3 API sends decimal strings, and Planet Pay wants integer
//! minor units (grosze). [`Money`] is the common shape, with lossless
//! conversion in both directions.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors converting between monetary representations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MoneyError {
    /// The amount string could not be parsed as a decimal.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The amount does not fit the requested minor-unit representation.
    #[error("amount {0} cannot be represented in minor units")]
    MinorUnitOverflow(Decimal),
}

/// A monetary amount with its ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount in the currency's major unit (e.g. 12.34 PLN).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g. "PLN").
    pub currency: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse a decimal string (WooCommerce v3 style, e.g. `"129.00"`).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidAmount` if the string is not a decimal.
    pub fn parse(amount: &str, currency: impl Into<String>) -> Result<Self, MoneyError> {
        let amount = amount
            .trim()
            .parse::<Decimal>()
            .map_err(|_| MoneyError::InvalidAmount(amount.to_owned()))?;
        Ok(Self::new(amount, currency))
    }

    /// Build from integer minor units and an exponent (Store API style:
    /// `12999` with `minor_unit == 2` is `129.99`).
    #[must_use]
    pub fn from_minor_units(minor: i64, minor_unit: u32, currency: impl Into<String>) -> Self {
        Self::new(Decimal::new(minor, minor_unit), currency)
    }

    /// Convert to integer minor units (Planet Pay style).
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::MinorUnitOverflow` if the scaled amount does not
    /// fit in an `i64`.
    pub fn to_minor_units(&self, minor_unit: u32) -> Result<i64, MoneyError> {
        let mut scaled = self.amount;
        scaled.rescale(minor_unit);
        let factor = Decimal::from(10_i64.pow(minor_unit));
        (scaled * factor)
            .to_i64()
            .ok_or(MoneyError::MinorUnitOverflow(self.amount))
    }

    /// Whether the amount is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_string() {
        let money = Money::parse("129.00", "PLN").unwrap();
        assert_eq!(money.amount, Decimal::new(12900, 2));
        assert_eq!(money.currency, "PLN");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("12,99", "PLN"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_from_minor_units() {
        let money = Money::from_minor_units(12999, 2, "PLN");
        assert_eq!(money.to_string(), "129.99 PLN");
    }

    #[test]
    fn test_to_minor_units() {
        let money = Money::parse("129.99", "PLN").unwrap();
        assert_eq!(money.to_minor_units(2).unwrap(), 12999);
    }

    #[test]
    fn test_to_minor_units_rounds_subminor_digits() {
        // 1.005 PLN has no exact grosz representation; banker's rounding applies
        let money = Money::new(Decimal::new(1005, 3), "PLN");
        assert_eq!(money.to_minor_units(2).unwrap(), 100);
    }

    #[test]
    fn test_minor_unit_round_trip() {
        let money = Money::from_minor_units(100, 2, "PLN");
        assert_eq!(money.to_minor_units(2).unwrap(), 100);
    }

    #[test]
    fn test_display() {
        let money = Money::parse("5", "PLN").unwrap();
        assert_eq!(money.to_string(), "5.00 PLN");
    }

    #[test]
    fn test_is_positive() {
        assert!(Money::parse("0.01", "PLN").unwrap().is_positive());
        assert!(!Money::zero("PLN").is_positive());
    }
}
