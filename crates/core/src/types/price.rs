//! Money and quantity utilities using decimal arithmetic.
//!
//! All amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (dollars, not cents). Rounding is to two places, midpoint away from zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format_price(self.amount, self.currency_code)
    }
}

/// ISO 4217 currency codes.
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
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
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
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

/// Round a monetary amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with its currency symbol and exactly two decimals.
///
/// ```
/// use basket_core::{CurrencyCode, format_price};
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_price(Decimal::new(5835, 2), CurrencyCode::USD), "$58.35");
/// assert_eq!(format_price(Decimal::new(-1, 0), CurrencyCode::USD), "-$1.00");
/// ```
#[must_use]
pub fn format_price(amount: Decimal, currency: CurrencyCode) -> String {
    let mut magnitude = round_money(amount.abs());
    magnitude.rescale(2);
    let sign = if amount.is_sign_negative() && !magnitude.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{magnitude}", currency.symbol())
}

/// Whole percentage saved against a compare-at price.
///
/// Returns `None` when there is no compare-at price or it isn't higher than
/// the selling price.
#[must_use]
pub fn discount_percent(price: Decimal, compare_at: Option<Decimal>) -> Option<u32> {
    let compare_at = compare_at?;
    if compare_at <= price || compare_at <= Decimal::ZERO {
        return None;
    }
    let percent = (compare_at - price) / compare_at * Decimal::ONE_HUNDRED;
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}

/// Apply a stepper delta to a quantity, clamped into `1..=limit`.
///
/// `limit` is the available stock when inventory is tracked, `None` otherwise.
/// A limit of zero still yields 1; rejecting an unavailable product is the
/// cart's job, not the stepper's.
#[must_use]
pub fn clamp_quantity(current: u32, delta: i64, limit: Option<u32>) -> u32 {
    let max = limit.map_or(u32::MAX, |l| l.max(1));
    let target = i64::from(current).saturating_add(delta);
    u32::try_from(target.clamp(1, i64::from(max))).unwrap_or(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_pads_to_cents() {
        assert_eq!(format_price(Decimal::new(42, 0), CurrencyCode::USD), "$42.00");
        assert_eq!(format_price(Decimal::new(1299, 2), CurrencyCode::EUR), "€12.99");
        assert_eq!(format_price(Decimal::new(10005, 3), CurrencyCode::GBP), "£10.01");
    }

    #[test]
    fn test_format_price_negative_zero() {
        assert_eq!(format_price(Decimal::new(-1, 3), CurrencyCode::USD), "$0.00");
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::CAD);
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(
            discount_percent(Decimal::new(75, 0), Some(Decimal::new(100, 0))),
            Some(25)
        );
        assert_eq!(
            discount_percent(Decimal::new(2, 0), Some(Decimal::new(3, 0))),
            Some(33)
        );
        assert_eq!(discount_percent(Decimal::new(10, 0), None), None);
        assert_eq!(
            discount_percent(Decimal::new(10, 0), Some(Decimal::new(8, 0))),
            None
        );
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(1, -1, None), 1);
        assert_eq!(clamp_quantity(3, 2, Some(4)), 4);
        assert_eq!(clamp_quantity(3, 1, Some(10)), 4);
        assert_eq!(clamp_quantity(2, -5, Some(10)), 1);
        assert_eq!(clamp_quantity(1, 3, Some(0)), 1);
        assert_eq!(clamp_quantity(u32::MAX, 1, None), u32::MAX);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<CurrencyCode>(), Ok(CurrencyCode::USD));
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
