//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are kept in the currency's standard unit (pesos, not centavos)
/// and rendered with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Philippine pesos.
    #[must_use]
    pub const fn php(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::PHP)
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: i64) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds two prices. Both sides are expected to share a currency; the
    /// left-hand currency is kept.
    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    PHP,
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::PHP => "₱",
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pesos() {
        let price = Price::php(Decimal::new(2500, 2));
        assert_eq!(price.to_string(), "₱25.00");

        let price = Price::php(Decimal::new(15, 0));
        assert_eq!(price.to_string(), "₱15.00");
    }

    #[test]
    fn test_times_and_add() {
        let unit = Price::php(Decimal::new(2500, 2));
        let line = unit.times(2);
        assert_eq!(line.amount, Decimal::new(5000, 2));

        let total = line + Price::php(Decimal::new(50, 0));
        assert_eq!(total.to_string(), "₱100.00");
    }

    #[test]
    fn test_default_currency_is_php() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::PHP);
        assert_eq!(Price::zero(CurrencyCode::default()).to_string(), "₱0.00");
    }
}
