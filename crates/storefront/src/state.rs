//! Per-user session state shared across callers.

use std::sync::Arc;

use basket_core::{UserId, format_price};
use rust_decimal::Decimal;
use tracing::info;

use crate::api::{ApiError, CartApi, FavoritesApi, OrderApi, PredictionApi, RestClient};
use crate::config::StorefrontConfig;
use crate::services::{CartService, CheckoutService, FavoritesService, PredictionService};

/// Remote ports a session talks to.
#[derive(Clone)]
pub struct Backends {
    pub cart: Arc<dyn CartApi>,
    pub orders: Arc<dyn OrderApi>,
    pub favorites: Arc<dyn FavoritesApi>,
    pub predictions: Arc<dyn PredictionApi>,
}

impl Backends {
    /// Use one implementation for every port.
    #[must_use]
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: CartApi + OrderApi + FavoritesApi + PredictionApi + 'static,
    {
        Self {
            cart: Arc::clone(&backend) as Arc<dyn CartApi>,
            orders: Arc::clone(&backend) as Arc<dyn OrderApi>,
            favorites: Arc::clone(&backend) as Arc<dyn FavoritesApi>,
            predictions: backend as Arc<dyn PredictionApi>,
        }
    }
}

/// Everything one signed-in user's session owns.
///
/// This struct is cheaply cloneable via `Arc`; clones share the same cart,
/// checkout and favorites state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: StorefrontConfig,
    user_id: UserId,
    cart: CartService,
    checkout: CheckoutService,
    favorites: FavoritesService,
    predictions: PredictionService,
}

impl SessionContext {
    /// Create a session backed by the REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn init(config: StorefrontConfig, user_id: UserId) -> Result<Self, ApiError> {
        let client = Arc::new(RestClient::new(&config)?);
        Ok(Self::with_backends(config, user_id, Backends::shared(client)))
    }

    /// Create a session over arbitrary port implementations.
    #[must_use]
    pub fn with_backends(config: StorefrontConfig, user_id: UserId, backends: Backends) -> Self {
        let cart = CartService::new(backends.cart);
        let checkout = CheckoutService::new(cart.clone(), backends.orders);
        let favorites = FavoritesService::new(backends.favorites, user_id);
        let predictions = PredictionService::new(backends.predictions, &config);

        info!(%user_id, base_url = %config.api_base_url, "Session started");

        Self {
            inner: Arc::new(SessionInner {
                config,
                user_id,
                cart,
                checkout,
                favorites,
                predictions,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.inner.user_id
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoritesService {
        &self.inner.favorites
    }

    #[must_use]
    pub fn predictions(&self) -> &PredictionService {
        &self.inner.predictions
    }

    /// Format an amount in the configured display currency.
    #[must_use]
    pub fn format_price(&self, amount: Decimal) -> String {
        format_price(amount, self.inner.config.currency)
    }

    /// End the session.
    ///
    /// Responses still in flight are discarded when they arrive. Further cart,
    /// checkout and favorites calls fail with
    /// [`StoreError::SessionClosed`](crate::StoreError::SessionClosed).
    pub async fn teardown(&self) {
        self.inner.cart.close();
        self.inner.favorites.close();
        self.inner.predictions.clear().await;
        info!(user_id = %self.inner.user_id, "Session closed");
    }
}
