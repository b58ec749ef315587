//! Minor-unit money representation.
//!
//! The external commerce service expresses all amounts in the smallest
//! currency unit (cents for USD). Local prices arrive as decimal major
//! units and are rounded once, at the boundary, when a sync mutation is
//! built.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// The ISO 4217 code as a static string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// Parse a currency code string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "CAD" => Some(Self::CAD),
            "AUD" => Some(Self::AUD),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A money amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents for USD).
    pub cent_amount: i64,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a money amount directly from minor units.
    #[must_use]
    pub const fn from_cents(cent_amount: i64, currency_code: CurrencyCode) -> Self {
        Self {
            cent_amount,
            currency_code,
        }
    }

    /// Convert a decimal major-unit price (e.g., 4.99 USD) to minor units,
    /// rounding half away from zero.
    ///
    /// Returns `None` if the scaled amount does not fit in an `i64`.
    #[must_use]
    pub fn from_major(amount: Decimal, currency_code: CurrencyCode) -> Option<Self> {
        let cents = amount
            .checked_mul(Decimal::from(100))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Some(Self {
            cent_amount: cents.to_i64()?,
            currency_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_from_major_exact() {
        let money = Money::from_major(Decimal::new(499, 2), CurrencyCode::USD).expect("fits");
        assert_eq!(money.cent_amount, 499);
    }

    #[test]
    fn test_from_major_rounds_half_up() {
        // 1.005 -> 101 cents (half away from zero)
        let money = Money::from_major(Decimal::new(1005, 3), CurrencyCode::USD).expect("fits");
        assert_eq!(money.cent_amount, 101);
    }

    #[test]
    fn test_from_major_whole_dollars() {
        let money = Money::from_major(Decimal::from(5), CurrencyCode::USD).expect("fits");
        assert_eq!(money.cent_amount, 500);
    }

    #[test]
    fn test_from_major_rounds_half_away_from_zero_negative() {
        let money = Money::from_major(Decimal::new(-1005, 3), CurrencyCode::USD).expect("fits");
        assert_eq!(money.cent_amount, -101);
    }

    #[test]
    fn test_from_major_overflow_is_none() {
        assert_eq!(Money::from_major(Decimal::MAX, CurrencyCode::USD), None);
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(CurrencyCode::parse("USD"), Some(CurrencyCode::USD));
        assert_eq!(CurrencyCode::parse("XYZ"), None);
    }
}
