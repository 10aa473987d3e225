//! Scripted port fakes for service unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use basket_core::{
    Cart, CartItem, LineId, OrderId, OrderRequest, PredictionComparison, Product, ProductId,
    UserId,
};
use rust_decimal::Decimal;

use crate::api::{ApiError, ApiResult, CartApi, FavoritesApi, OrderApi, PredictionApi};

pub fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "unavailable".to_string(),
    }
}

pub fn product(id: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        handle: format!("product-{id}"),
        image_url: None,
        category: None,
        price: Decimal::new(250, 2),
        compare_at_price: None,
        stock,
        track_inventory: true,
    }
}

/// A remote cart snapshot with server-assigned line ids.
pub fn remote(lines: &[(&str, Product, u32)]) -> Cart {
    Cart::from_lines(
        None,
        lines
            .iter()
            .map(|(id, product, qty)| CartItem::new(LineId::new(*id), product.clone(), *qty))
            .collect(),
    )
}

/// Replays queued responses in order, for every port, and records which
/// endpoints were hit. An exhausted queue answers 503.
#[derive(Default)]
pub struct Scripted {
    carts: Mutex<VecDeque<ApiResult<Cart>>>,
    orders: Mutex<VecDeque<ApiResult<OrderId>>>,
    flags: Mutex<VecDeque<ApiResult<bool>>>,
    predictions: Mutex<VecDeque<ApiResult<PredictionComparison>>>,
    calls: Mutex<Vec<&'static str>>,
    fetches: AtomicUsize,
}

impl Scripted {
    pub fn cart(&self, response: ApiResult<Cart>) {
        self.carts.lock().unwrap().push_back(response);
    }

    pub fn order(&self, response: ApiResult<OrderId>) {
        self.orders.lock().unwrap().push_back(response);
    }

    /// Queue a favorites response; `add`/`remove` treat `Ok(_)` as success.
    pub fn flag(&self, response: ApiResult<bool>) {
        self.flags.lock().unwrap().push_back(response);
    }

    pub fn prediction(&self, response: ApiResult<PredictionComparison>) {
        self.predictions.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prediction_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(&self, call: &'static str, queue: &Mutex<VecDeque<ApiResult<T>>>) -> ApiResult<T> {
        self.record(call);
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable()))
    }
}

#[async_trait]
impl CartApi for Scripted {
    async fn get_cart(&self) -> ApiResult<Cart> {
        self.next("get", &self.carts)
    }

    async fn add_item(&self, _: ProductId, _: u32) -> ApiResult<Cart> {
        self.next("add", &self.carts)
    }

    async fn update_item(&self, _: &LineId, _: u32) -> ApiResult<Cart> {
        self.next("update", &self.carts)
    }

    async fn remove_item(&self, _: &LineId) -> ApiResult<Cart> {
        self.next("remove", &self.carts)
    }

    async fn clear(&self) -> ApiResult<Cart> {
        self.next("clear", &self.carts)
    }
}

#[async_trait]
impl OrderApi for Scripted {
    async fn create_order(&self, _: &OrderRequest) -> ApiResult<OrderId> {
        self.next("create_order", &self.orders)
    }
}

#[async_trait]
impl FavoritesApi for Scripted {
    async fn list(&self, _: UserId) -> ApiResult<Vec<Product>> {
        self.record("list_favorites");
        Ok(Vec::new())
    }

    async fn add(&self, _: UserId, _: ProductId) -> ApiResult<()> {
        self.next("add_favorite", &self.flags).map(|_| ())
    }

    async fn remove(&self, _: UserId, _: ProductId) -> ApiResult<()> {
        self.next("remove_favorite", &self.flags).map(|_| ())
    }

    async fn check(&self, _: UserId, _: ProductId) -> ApiResult<bool> {
        self.next("check_favorite", &self.flags)
    }
}

#[async_trait]
impl PredictionApi for Scripted {
    async fn fetch(&self, _: UserId) -> ApiResult<PredictionComparison> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.next("fetch_predictions", &self.predictions)
    }
}
