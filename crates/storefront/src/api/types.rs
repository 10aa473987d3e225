//! Wire payloads for the storefront REST API.

use basket_core::{Cart, CartId, CartItem, LineId, OrderId, Product, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /cart/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `PUT /cart/items/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateQuantityInput {
    pub quantity: u32,
}

/// Body of `POST /favorites/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteInput {
    pub user_id: UserId,
    pub product_id: ProductId,
}

// =============================================================================
// Responses
// =============================================================================

/// Full cart representation returned by every cart endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default, alias = "lines")]
    pub items: Vec<CartLinePayload>,
}

/// One cart line as the server reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinePayload {
    pub id: RawLineId,
    pub product: Product,
    pub quantity: u32,
    /// Price snapshot; the product's current price when absent.
    #[serde(default, alias = "price")]
    pub unit_price: Option<Decimal>,
}

/// Line ids arrive as strings or integers depending on the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLineId {
    Text(String),
    Number(i64),
}

impl From<RawLineId> for LineId {
    fn from(raw: RawLineId) -> Self {
        match raw {
            RawLineId::Text(id) => Self::new(id),
            RawLineId::Number(id) => Self::new(id.to_string()),
        }
    }
}

impl From<CartLinePayload> for CartItem {
    fn from(line: CartLinePayload) -> Self {
        let mut item = Self::new(line.id.into(), line.product, line.quantity);
        if let Some(unit_price) = line.unit_price {
            item.unit_price = unit_price;
        }
        item
    }
}

impl From<CartPayload> for Cart {
    fn from(payload: CartPayload) -> Self {
        Self::from_lines(
            payload.id,
            payload.items.into_iter().map(CartItem::from).collect(),
        )
    }
}

/// Response of `POST /orders/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    #[serde(alias = "orderId")]
    pub id: OrderId,
}

/// Response of `GET /favorites/check/:productId`, a bare boolean or wrapped.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum FavoriteCheck {
    Bare(bool),
    Wrapped {
        #[serde(alias = "isFavorite", alias = "isFavorited")]
        favorited: bool,
    },
}

impl FavoriteCheck {
    #[must_use]
    pub const fn favorited(self) -> bool {
        match self {
            Self::Bare(favorited) | Self::Wrapped { favorited } => favorited,
        }
    }
}

/// One entry of `GET /favorites/user/:id`, either a bare product or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FavoriteEntry {
    Wrapped { product: Product },
    Bare(Product),
}

impl From<FavoriteEntry> for Product {
    fn from(entry: FavoriteEntry) -> Self {
        match entry {
            FavoriteEntry::Wrapped { product } | FavoriteEntry::Bare(product) => product,
        }
    }
}
