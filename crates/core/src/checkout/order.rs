//! Order-creation request assembled from the cart and a completed draft.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::draft::{CheckoutDraft, ShippingAddress};
use super::schema::{FieldError, ValidationError};
use super::wizard::CheckoutStep;
use crate::cart::Cart;
use crate::pricing::PriceSummary;
use crate::types::{CartId, DeliveryType, PaymentMethod, ProductId};

/// A purchased line as sent to the order endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Delivery choice, with schedule fields only for scheduled delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySelection {
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time_start: Option<String>,
}

/// Body of `POST /orders/create`.
///
/// Card payments carry only the last four digits of the card number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<CartId>,
    pub lines: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub delivery: DeliverySelection,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub pricing: PriceSummary,
}

impl OrderRequest {
    /// Assemble the request from a cart and a validated draft.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the delivery type or payment method
    /// was never selected.
    pub fn build(cart: &Cart, draft: &CheckoutDraft) -> Result<Self, ValidationError> {
        let Some(delivery_type) = draft.delivery_type else {
            return Err(missing(
                CheckoutStep::Delivery,
                "delivery_type",
                "Choose a delivery option",
            ));
        };
        let Some(payment_method) = draft.payment_method else {
            return Err(missing(
                CheckoutStep::Payment,
                "payment_method",
                "Choose a payment method",
            ));
        };

        let scheduled = delivery_type == DeliveryType::Scheduled;
        let notes = draft.notes.trim();

        Ok(Self {
            cart_id: cart.id(),
            lines: cart
                .lines()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            shipping_address: draft.address.clone(),
            delivery: DeliverySelection {
                delivery_type,
                scheduled_date: draft.scheduled_date.filter(|_| scheduled),
                scheduled_time_start: draft
                    .scheduled_time_start
                    .clone()
                    .filter(|_| scheduled),
            },
            payment_method,
            card_last4: draft.card_last4(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            pricing: PriceSummary::compute(cart, Some(delivery_type)),
        })
    }
}

fn missing(step: CheckoutStep, field: &'static str, message: &'static str) -> ValidationError {
    ValidationError {
        step,
        fields: vec![FieldError { field, message }],
    }
}
