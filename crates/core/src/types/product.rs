//! Product as served by the catalog.
//!
//! Products are read-only from the engine's point of view: the cart snapshots
//! one per line, and the alignment engine pairs them by [`ProductId`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::discount_percent;

/// A catalog product.
///
/// Display fields default when absent so sparse payloads (for example the
/// baskets returned by the prediction service) still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    #[serde(default, alias = "name")]
    pub title: String,
    /// URL handle.
    #[serde(default)]
    pub handle: String,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category name.
    #[serde(default)]
    pub category: Option<String>,
    /// Current selling price.
    #[serde(default)]
    pub price: Decimal,
    /// Original price, shown struck through when higher than `price`.
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    /// Units on hand.
    #[serde(default)]
    pub stock: u32,
    /// Whether `stock` limits purchasable quantity.
    #[serde(default)]
    pub track_inventory: bool,
}

impl Product {
    /// Stock ceiling for cart quantities, if inventory is tracked.
    #[must_use]
    pub const fn available_stock(&self) -> Option<u32> {
        if self.track_inventory {
            Some(self.stock)
        } else {
            None
        }
    }

    /// Whether the product can be added to a cart at all.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.track_inventory || self.stock > 0
    }

    /// Per-unit saving against the compare-at price, never negative.
    #[must_use]
    pub fn unit_savings(&self) -> Decimal {
        self.compare_at_price
            .map_or(Decimal::ZERO, |compare_at| {
                (compare_at - self.price).max(Decimal::ZERO)
            })
    }

    /// Whole percent discount for badge display.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        discount_percent(self.price, self.compare_at_price)
    }
}
