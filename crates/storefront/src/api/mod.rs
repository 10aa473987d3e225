//! Remote collaborator ports.
//!
//! The services depend only on these traits. [`RestClient`] implements all of
//! them over HTTP; tests substitute in-memory fakes.
//!
//! Every cart call returns the full updated cart so the caller can install it
//! as the authoritative snapshot.

mod client;
pub mod types;

use async_trait::async_trait;
use basket_core::{
    Cart, LineId, OrderId, OrderRequest, PredictionComparison, Product, ProductId, UserId,
};
use thiserror::Error;

pub use client::RestClient;

/// Transport-level errors. Services translate these before they reach callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for port calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Remote cart of the current session.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get_cart(&self) -> ApiResult<Cart>;

    async fn add_item(&self, product_id: ProductId, quantity: u32) -> ApiResult<Cart>;

    async fn update_item(&self, line_id: &LineId, quantity: u32) -> ApiResult<Cart>;

    async fn remove_item(&self, line_id: &LineId) -> ApiResult<Cart>;

    async fn clear(&self) -> ApiResult<Cart>;
}

/// Order creation.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> ApiResult<OrderId>;
}

/// A user's favorite products.
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn list(&self, user_id: UserId) -> ApiResult<Vec<Product>>;

    async fn add(&self, user_id: UserId, product_id: ProductId) -> ApiResult<()>;

    async fn remove(&self, user_id: UserId, product_id: ProductId) -> ApiResult<()>;

    async fn check(&self, user_id: UserId, product_id: ProductId) -> ApiResult<bool>;
}

/// Predicted and actual baskets for a user.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn fetch(&self, user_id: UserId) -> ApiResult<PredictionComparison>;
}
