//! Order pricing derived from the cart and the chosen delivery option.
//!
//! Nothing here is cached: [`PriceSummary::compute`] is called whenever the
//! cart or the delivery selection changes, so totals can never drift from the
//! lines they were computed from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{DeliveryType, round_money};

/// Sales tax applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// A delivery choice with its flat fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryOption {
    pub delivery_type: DeliveryType,
    pub label: &'static str,
    pub description: &'static str,
    pub fee: Decimal,
}

/// Every delivery option, in display order.
pub const DELIVERY_OPTIONS: [DeliveryOption; 3] = [
    DeliveryOption {
        delivery_type: DeliveryType::Standard,
        label: "Standard Delivery",
        description: "5-7 business days",
        fee: Decimal::from_parts(599, 0, 0, false, 2),
    },
    DeliveryOption {
        delivery_type: DeliveryType::Express,
        label: "Express Delivery",
        description: "1-2 business days",
        fee: Decimal::from_parts(1299, 0, 0, false, 2),
    },
    DeliveryOption {
        delivery_type: DeliveryType::Scheduled,
        label: "Scheduled Delivery",
        description: "Pick a date and time slot",
        fee: Decimal::from_parts(999, 0, 0, false, 2),
    },
];

impl DeliveryType {
    /// The option table entry for this delivery type.
    #[must_use]
    pub const fn option(self) -> DeliveryOption {
        match self {
            Self::Standard => DELIVERY_OPTIONS[0],
            Self::Express => DELIVERY_OPTIONS[1],
            Self::Scheduled => DELIVERY_OPTIONS[2],
        }
    }

    /// Flat delivery fee.
    #[must_use]
    pub const fn fee(self) -> Decimal {
        self.option().fee
    }
}

/// Totals shown on the checkout sidebar and sent with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl PriceSummary {
    /// Derive totals for a cart. No delivery selection means no fee yet.
    #[must_use]
    pub fn compute(cart: &Cart, delivery: Option<DeliveryType>) -> Self {
        Self::from_subtotal(cart.subtotal(), cart.savings(), delivery)
    }

    /// Derive totals from a known subtotal.
    #[must_use]
    pub fn from_subtotal(
        subtotal: Decimal,
        savings: Decimal,
        delivery: Option<DeliveryType>,
    ) -> Self {
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * TAX_RATE);
        let delivery_fee = delivery.map_or(Decimal::ZERO, DeliveryType::fee);
        Self {
            subtotal,
            savings: round_money(savings),
            tax,
            delivery_fee,
            total: subtotal + tax + delivery_fee,
        }
    }
}
