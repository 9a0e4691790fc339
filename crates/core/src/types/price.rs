//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices are stored in a single base unit (USD). Display prices are
//! derived through a static exchange-rate table and rounded to two decimal
//! places only when presented.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Round a money amount to 2 decimal places, midpoints away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unknown currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency: {0}")]
pub struct CurrencyError(pub String);

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// All supported currencies, in display order.
    pub const ALL: [Self; 3] = [Self::USD, Self::EUR, Self::GBP];

    /// Exchange rate from the base unit (USD) into this currency.
    #[must_use]
    pub const fn rate(self) -> Decimal {
        match self {
            Self::USD => Decimal::ONE,
            Self::EUR => Decimal::from_parts(92, 0, 0, false, 2),
            Self::GBP => Decimal::from_parts(79, 0, 0, false, 2),
        }
    }

    /// Currency symbol used when formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO code as a string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Convert an amount in the base unit into this currency (unrounded).
    #[must_use]
    pub fn convert(self, base_amount: Decimal) -> Decimal {
        base_amount * self.rate()
    }

    /// Convert and format a base-unit amount, e.g. `€23.00`.
    #[must_use]
    pub fn format(self, base_amount: Decimal) -> String {
        Price::from_base(base_amount, self).to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(CurrencyError(s.to_string())),
        }
    }
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
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

    /// Convert a base-unit (USD) amount into `currency_code`.
    #[must_use]
    pub fn from_base(base_amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self::new(currency_code.convert(base_amount), currency_code)
    }

    /// The amount rounded for presentation.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round_money(self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}
