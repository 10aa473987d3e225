//! Selection enums used by the checkout draft.

use serde::{Deserialize, Serialize};

/// How the order is delivered.
///
/// Each type maps to a flat fee in [`crate::pricing::DeliveryOption`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Standard,
    Express,
    /// Delivery on a chosen date and time slot.
    Scheduled,
}

impl std::fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Express => write!(f, "express"),
            Self::Scheduled => write!(f, "scheduled"),
        }
    }
}

impl std::str::FromStr for DeliveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "scheduled" => Ok(Self::Scheduled),
            _ => Err(format!("invalid delivery type: {s}")),
        }
    }
}

/// Payment method chosen at checkout.
///
/// Payment is demo-only; no method is charged against a real processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Paypal,
    ApplePay,
    GooglePay,
}

impl PaymentMethod {
    /// Whether the draft's card fields apply to this method.
    #[must_use]
    pub const fn uses_card_fields(self) -> bool {
        matches!(self, Self::Card)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Paypal => write!(f, "paypal"),
            Self::ApplePay => write!(f, "applepay"),
            Self::GooglePay => write!(f, "googlepay"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::Paypal),
            "applepay" => Ok(Self::ApplePay),
            "googlepay" => Ok(Self::GooglePay),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
