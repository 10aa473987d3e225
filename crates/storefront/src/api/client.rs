//! REST implementation of the remote ports.
//!
//! Uses `reqwest` 0.13 with JSON bodies. Every endpoint path is appended to
//! the configured base URL as path segments, so ids are percent-encoded.

use std::sync::Arc;

use async_trait::async_trait;
use basket_core::{
    Cart, LineId, OrderId, OrderRequest, PredictionComparison, Product, ProductId, UserId,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, error, instrument};
use url::Url;

use super::types::{
    AddToCartInput, CartPayload, FavoriteCheck, FavoriteEntry, FavoriteInput, OrderCreated,
    UpdateQuantityInput,
};
use super::{ApiError, ApiResult, CartApi, FavoritesApi, OrderApi, PredictionApi};
use crate::config::StorefrontConfig;

/// Longest slice of a response body kept in logs and error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Build an endpoint URL from path segments.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %excerpt(&body),
                "Storefront API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // 204 and friends: decode as `null`
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| {
            error!(
                error = %e,
                body = %excerpt(body),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    async fn execute_cart(&self, request: RequestBuilder) -> ApiResult<Cart> {
        let payload: CartPayload = self.execute(request).await?;
        let cart = Cart::from(payload);
        debug!(lines = cart.len(), "Received cart snapshot");
        Ok(cart)
    }
}

#[async_trait]
impl CartApi for RestClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart"])?;
        self.execute_cart(self.inner.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", "add"])?;
        let body = AddToCartInput {
            product_id,
            quantity,
        };
        self.execute_cart(self.inner.client.post(url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn update_item(&self, line_id: &LineId, quantity: u32) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", "items", line_id.as_str()])?;
        let body = UpdateQuantityInput { quantity };
        self.execute_cart(self.inner.client.put(url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_item(&self, line_id: &LineId) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", "items", line_id.as_str()])?;
        self.execute_cart(self.inner.client.delete(url)).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", "clear"])?;
        self.execute_cart(self.inner.client.post(url)).await
    }
}

#[async_trait]
impl OrderApi for RestClient {
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn create_order(&self, request: &OrderRequest) -> ApiResult<OrderId> {
        let url = self.endpoint(&["orders", "create"])?;
        let created: OrderCreated = self
            .execute(self.inner.client.post(url).json(request))
            .await?;
        Ok(created.id)
    }
}

#[async_trait]
impl FavoritesApi for RestClient {
    #[instrument(skip(self))]
    async fn list(&self, user_id: UserId) -> ApiResult<Vec<Product>> {
        let url = self.endpoint(&["favorites", "user", &user_id.to_string()])?;
        let entries: Vec<FavoriteEntry> = self.execute(self.inner.client.get(url)).await?;
        Ok(entries.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn add(&self, user_id: UserId, product_id: ProductId) -> ApiResult<()> {
        let url = self.endpoint(&["favorites", "add"])?;
        let body = FavoriteInput {
            user_id,
            product_id,
        };
        let _: IgnoredAny = self
            .execute(self.inner.client.post(url).json(&body))
            .await?;
        Ok(())
    }

    // The route is scoped to the authenticated user.
    #[instrument(skip(self))]
    async fn remove(&self, _user_id: UserId, product_id: ProductId) -> ApiResult<()> {
        let url = self.endpoint(&["favorites", &product_id.to_string()])?;
        let _: IgnoredAny = self.execute(self.inner.client.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check(&self, _user_id: UserId, product_id: ProductId) -> ApiResult<bool> {
        let url = self.endpoint(&["favorites", "check", &product_id.to_string()])?;
        let check: FavoriteCheck = self.execute(self.inner.client.get(url)).await?;
        Ok(check.favorited())
    }
}

#[async_trait]
impl PredictionApi for RestClient {
    #[instrument(skip(self))]
    async fn fetch(&self, user_id: UserId) -> ApiResult<PredictionComparison> {
        let url = self.endpoint(&["predictions", "user", &user_id.to_string()])?;
        self.execute(self.inner.client.get(url)).await
    }
}

/// First characters of a body, for logs.
fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Pull a readable message out of an error body.
///
/// Prefers a JSON `message` or `error` string field and falls back to the
/// body excerpt.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| excerpt(body))
}
