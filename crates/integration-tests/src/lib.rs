//! Integration tests for the basket engine.
//!
//! [`FakeBackend`] stands in for the remote storefront API. It keeps a real
//! in-memory cart (with server-assigned line ids), an order log, a favorites
//! set and a prediction fixture, and lets tests:
//!
//! - fail the next call to an endpoint with a 503 ([`FakeBackend::fail_next`])
//! - hold the next call to an endpoint until released ([`FakeBackend::hold`])
//!
//! A held call computes its response when it arrives and only returns it on
//! release, which models a slow network rather than a slow server.
//!
//! # Test Categories
//!
//! - `cart_sync` - Optimistic cart mutations, rollback, stale responses
//! - `checkout_flow` - Wizard navigation and order submission
//! - `favorites` - Optimistic favorite toggles
//! - `prediction_comparison` - Basket alignment and caching

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use basket_core::{
    Cart, CartId, CartItem, LineId, OrderId, OrderRequest, PredictionComparison, Product,
    ProductId, UserId,
};
use basket_storefront::api::{
    ApiError, ApiResult, CartApi, FavoritesApi, OrderApi, PredictionApi,
};
use basket_storefront::{Backends, SessionContext, StorefrontConfig};
use rust_decimal::Decimal;
use tokio::sync::Notify;

/// Remote endpoints the fake serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetCart,
    AddItem,
    UpdateItem,
    RemoveItem,
    ClearCart,
    CreateOrder,
    ListFavorites,
    AddFavorite,
    RemoveFavorite,
    CheckFavorite,
    FetchPredictions,
}

/// Holds one call until the test releases it.
#[derive(Debug, Default)]
pub struct Gate {
    arrived: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the held call has reached the fake.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    /// Let the held call return its response.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug, Default)]
struct FakeState {
    catalog: HashMap<ProductId, Product>,
    lines: Vec<CartItem>,
    line_seq: u64,
    orders: Vec<OrderRequest>,
    favorites: BTreeSet<ProductId>,
    prediction: PredictionComparison,
    failures: HashMap<Endpoint, usize>,
    gates: HashMap<Endpoint, Arc<Gate>>,
    calls: Vec<Endpoint>,
}

impl FakeState {
    fn snapshot(&self) -> Cart {
        Cart::from_lines(Some(CartId::new(1)), self.lines.clone())
    }

    fn take_failure(&mut self, endpoint: Endpoint) -> bool {
        match self.failures.get_mut(&endpoint) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn line_mut(&mut self, line_id: &LineId) -> ApiResult<&mut CartItem> {
        self.lines
            .iter_mut()
            .find(|item| &item.id == line_id)
            .ok_or_else(|| not_found(&format!("line {line_id}")))
    }
}

/// In-memory implementation of every remote port.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make a product known to the fake so it can be added by id.
    pub fn stock(&self, product: &Product) {
        self.lock().catalog.insert(product.id, product.clone());
    }

    /// Mark a product as a favorite on the server side.
    pub fn favorite(&self, product: &Product) {
        let mut state = self.lock();
        state.catalog.insert(product.id, product.clone());
        state.favorites.insert(product.id);
    }

    pub fn set_prediction(&self, comparison: PredictionComparison) {
        self.lock().prediction = comparison;
    }

    /// Fail the next call to `endpoint` with a 503.
    pub fn fail_next(&self, endpoint: Endpoint) {
        *self.lock().failures.entry(endpoint).or_default() += 1;
    }

    /// Hold the next call to `endpoint` until the returned gate is released.
    #[must_use]
    pub fn hold(&self, endpoint: Endpoint) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.lock().gates.insert(endpoint, Arc::clone(&gate));
        gate
    }

    /// Server-side cart as `(product, quantity)` pairs.
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(ProductId, u32)> {
        self.lock()
            .lines
            .iter()
            .map(|item| (item.product_id, item.quantity))
            .collect()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.lock().orders.clone()
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<ProductId> {
        self.lock().favorites.iter().copied().collect()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    /// How many times `endpoint` was called.
    #[must_use]
    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == endpoint)
            .count()
    }

    async fn respond<T, F>(&self, endpoint: Endpoint, handle: F) -> ApiResult<T>
    where
        T: Send,
        F: FnOnce(&mut FakeState) -> ApiResult<T> + Send,
    {
        let (gate, result) = {
            let mut state = self.lock();
            state.calls.push(endpoint);
            let gate = state.gates.remove(&endpoint);
            let result = if state.take_failure(endpoint) {
                Err(unavailable())
            } else {
                handle(&mut *state)
            };
            (gate, result)
        };

        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CartApi for FakeBackend {
    async fn get_cart(&self) -> ApiResult<Cart> {
        self.respond(Endpoint::GetCart, |state| Ok(state.snapshot()))
            .await
    }

    async fn add_item(&self, product_id: ProductId, quantity: u32) -> ApiResult<Cart> {
        self.respond(Endpoint::AddItem, |state| {
            if let Some(item) = state
                .lines
                .iter_mut()
                .find(|item| item.product_id == product_id)
            {
                item.quantity += quantity;
                return Ok(state.snapshot());
            }

            let product = state
                .catalog
                .get(&product_id)
                .cloned()
                .ok_or_else(|| not_found(&format!("product {product_id}")))?;
            state.line_seq += 1;
            let line_id = LineId::new(format!("line-{}", state.line_seq));
            state.lines.push(CartItem::new(line_id, product, quantity));
            Ok(state.snapshot())
        })
        .await
    }

    async fn update_item(&self, line_id: &LineId, quantity: u32) -> ApiResult<Cart> {
        self.respond(Endpoint::UpdateItem, |state| {
            state.line_mut(line_id)?.quantity = quantity;
            Ok(state.snapshot())
        })
        .await
    }

    async fn remove_item(&self, line_id: &LineId) -> ApiResult<Cart> {
        self.respond(Endpoint::RemoveItem, |state| {
            state.lines.retain(|item| &item.id != line_id);
            Ok(state.snapshot())
        })
        .await
    }

    async fn clear(&self) -> ApiResult<Cart> {
        self.respond(Endpoint::ClearCart, |state| {
            state.lines.clear();
            Ok(state.snapshot())
        })
        .await
    }
}

#[async_trait]
impl OrderApi for FakeBackend {
    async fn create_order(&self, request: &OrderRequest) -> ApiResult<OrderId> {
        self.respond(Endpoint::CreateOrder, |state| {
            state.orders.push(request.clone());
            let number = i64::try_from(state.orders.len()).unwrap_or(i64::MAX);
            Ok(OrderId::new(1000 + number))
        })
        .await
    }
}

#[async_trait]
impl FavoritesApi for FakeBackend {
    async fn list(&self, _user_id: UserId) -> ApiResult<Vec<Product>> {
        self.respond(Endpoint::ListFavorites, |state| {
            Ok(state
                .favorites
                .iter()
                .filter_map(|id| state.catalog.get(id).cloned())
                .collect())
        })
        .await
    }

    async fn add(&self, _user_id: UserId, product_id: ProductId) -> ApiResult<()> {
        self.respond(Endpoint::AddFavorite, |state| {
            state.favorites.insert(product_id);
            Ok(())
        })
        .await
    }

    async fn remove(&self, _user_id: UserId, product_id: ProductId) -> ApiResult<()> {
        self.respond(Endpoint::RemoveFavorite, |state| {
            state.favorites.remove(&product_id);
            Ok(())
        })
        .await
    }

    async fn check(&self, _user_id: UserId, product_id: ProductId) -> ApiResult<bool> {
        self.respond(Endpoint::CheckFavorite, |state| {
            Ok(state.favorites.contains(&product_id))
        })
        .await
    }
}

#[async_trait]
impl PredictionApi for FakeBackend {
    async fn fetch(&self, _user_id: UserId) -> ApiResult<PredictionComparison> {
        self.respond(Endpoint::FetchPredictions, |state| Ok(state.prediction.clone()))
            .await
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{what} not found"),
    }
}

/// A session for user 42 backed by `backend`.
#[must_use]
pub fn session(backend: &Arc<FakeBackend>) -> SessionContext {
    let config = StorefrontConfig::new(
        "http://localhost:8080/api/"
            .parse()
            .expect("literal url is valid"),
    );
    SessionContext::with_backends(
        config,
        UserId::new(42),
        Backends::shared(Arc::clone(backend)),
    )
}

/// A tracked-inventory product priced at `price` cents.
#[must_use]
pub fn product(id: i64, title: &str, price_cents: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        handle: title.to_lowercase().replace(' ', "-"),
        image_url: None,
        category: None,
        price: Decimal::new(price_cents, 2),
        compare_at_price: None,
        stock,
        track_inventory: true,
    }
}
