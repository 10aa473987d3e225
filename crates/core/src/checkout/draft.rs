//! The in-progress checkout form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DeliveryType, PaymentMethod};

/// Shipping address captured on the first checkout step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            address_line1: String::new(),
            address_line2: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "US".to_string(),
            phone: String::new(),
        }
    }
}

/// Working state of the checkout wizard.
///
/// Lives only for the duration of the checkout flow and is never persisted
/// remotely until the order is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    pub address: ShippingAddress,
    pub delivery_type: Option<DeliveryType>,
    /// Required only for scheduled delivery.
    pub scheduled_date: Option<NaiveDate>,
    /// Start of the chosen slot (`"HH:MM"`), scheduled delivery only.
    pub scheduled_time_start: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub card_number: String,
    pub card_name: String,
    pub card_expiry: String,
    pub card_cvc: String,
    pub notes: String,
}

impl CheckoutDraft {
    /// Whether the scheduled date/time fields are in play.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.delivery_type == Some(DeliveryType::Scheduled)
    }

    /// Last four digits of the card number, for card payments only.
    #[must_use]
    pub fn card_last4(&self) -> Option<String> {
        if !self.payment_method.is_some_and(PaymentMethod::uses_card_fields) {
            return None;
        }
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let start = digits.len().checked_sub(4)?;
        Some(digits.get(start..)?.iter().collect())
    }

    /// Select a delivery type, dropping schedule fields when they no longer apply.
    pub fn select_delivery(&mut self, delivery_type: DeliveryType) {
        self.delivery_type = Some(delivery_type);
        if delivery_type != DeliveryType::Scheduled {
            self.scheduled_date = None;
            self.scheduled_time_start = None;
        }
    }

    /// Select a payment method, wiping card fields when switching away from card.
    pub fn select_payment(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        if !method.uses_card_fields() {
            self.card_number.clear();
            self.card_name.clear();
            self.card_expiry.clear();
            self.card_cvc.clear();
        }
    }
}
