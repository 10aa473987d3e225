//! Optimistic cart synchronization.
//!
//! Every mutation runs in two phases:
//!
//! 1. Apply to the local cart and record the inverse together with a fresh
//!    generation number.
//! 2. Await the remote call. On success the returned snapshot is installed,
//!    but only if no newer cart call was issued meanwhile and the service is
//!    still open. On failure the recorded inverse is applied, the
//!    authoritative cart is re-fetched on a best-effort basis and a
//!    [`StoreError::Sync`] is returned.
//!
//! Local errors (out of stock, bad quantity, unknown line) return before
//! anything is sent. Mutations are not serialized against each other; they
//! reach the transport in the order they were issued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use basket_core::{Cart, CartError, CartMutation, LineId, Product, clamp_quantity};
use tracing::{info, instrument, warn};

use crate::api::{ApiResult, CartApi};
use crate::error::{Result, StoreError, SyncError, SyncOperation};

/// Handle to the session's cart.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    api: Arc<dyn CartApi>,
    state: Mutex<CartState>,
}

#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    /// Stamp of the most recently issued cart call.
    generation: u64,
    closed: bool,
}

impl CartState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::SessionClosed)
        } else {
            Ok(())
        }
    }

    const fn issue(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    const fn is_current(&self, generation: u64) -> bool {
        !self.closed && self.generation == generation
    }
}

/// A locally applied mutation awaiting its remote result.
struct Pending {
    operation: SyncOperation,
    generation: u64,
    inverse: CartMutation,
}

impl CartService {
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        Self {
            inner: Arc::new(CartServiceInner {
                api,
                state: Mutex::new(CartState::default()),
            }),
        }
    }

    /// Copy of the current local cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().cart.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Fetch the remote cart and install it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sync`] if the fetch fails; the local cart is unchanged.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Cart> {
        let generation = {
            let mut state = self.lock();
            state.ensure_open()?;
            state.issue()
        };

        match self.inner.api.get_cart().await {
            Ok(snapshot) => {
                info!(lines = snapshot.len(), "Cart loaded");
                Ok(self.install(generation, snapshot))
            }
            Err(err) => {
                warn!(error = %err, "Failed to load cart");
                Err(SyncError::new(SyncOperation::LoadCart, &err).into())
            }
        }
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// - [`StoreError::OutOfStock`] before any remote call.
    /// - [`StoreError::Sync`] if the remote add fails; the add is rolled back.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: Product, quantity: u32) -> Result<Cart> {
        let product_id = product.id;
        let pending = self.apply(SyncOperation::AddItem, |cart| {
            cart.add_item(product, quantity)
        })?;

        let result = self.inner.api.add_item(product_id, quantity).await;
        self.settle(pending, result).await
    }

    /// Set a line's quantity. Below 1 removes the line.
    ///
    /// # Errors
    ///
    /// - [`StoreError::OutOfStock`] or [`StoreError::Cart`] before any remote call.
    /// - [`StoreError::LinePending`] if the line hasn't been confirmed yet.
    /// - [`StoreError::Sync`] if the remote update fails; the update is rolled back.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> Result<Cart> {
        if quantity < 1 {
            return self.remove_item(line_id).await;
        }
        ensure_confirmed(line_id)?;

        let pending = self.apply(SyncOperation::UpdateItem, |cart| {
            cart.update_quantity(line_id, quantity)
        })?;

        let result = self.inner.api.update_item(line_id, quantity).await;
        self.settle(pending, result).await
    }

    /// Step a line's quantity up or down, clamped to `1..=stock`.
    ///
    /// # Errors
    ///
    /// As [`CartService::update_quantity`], plus [`StoreError::Cart`] for an
    /// unknown line.
    pub async fn adjust_quantity(&self, line_id: &LineId, delta: i64) -> Result<Cart> {
        let (current, target) = {
            let state = self.lock();
            let item = state
                .cart
                .line(line_id)
                .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;
            (
                item.quantity,
                clamp_quantity(item.quantity, delta, item.product.available_stock()),
            )
        };

        if target == current {
            return Ok(self.snapshot());
        }
        self.update_quantity(line_id, target).await
    }

    /// Remove a line. Removing an absent line sends nothing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::LinePending`] if the line hasn't been confirmed yet.
    /// - [`StoreError::Sync`] if the remote removal fails; the line is restored.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &LineId) -> Result<Cart> {
        ensure_confirmed(line_id)?;

        let pending = self.apply(SyncOperation::RemoveItem, |cart| {
            Ok(cart.remove_item(line_id))
        })?;
        if pending.inverse.is_noop() {
            return Ok(self.snapshot());
        }

        let result = self.inner.api.remove_item(line_id).await;
        self.settle(pending, result).await
    }

    /// Remove every line. Clearing an empty cart sends nothing.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sync`] if the remote clear fails; all lines are restored.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart> {
        let pending = self.apply(SyncOperation::ClearCart, |cart| Ok(cart.clear()))?;
        if pending.inverse.is_noop() {
            return Ok(self.snapshot());
        }

        let result = self.inner.api.clear().await;
        self.settle(pending, result).await
    }

    /// Empty the cart after an order was placed.
    ///
    /// The order already exists, so a failed remote clear is logged and the
    /// local cart stays empty.
    pub(crate) async fn discard_after_order(&self) {
        let generation = {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.cart.clear();
            state.issue()
        };

        match self.inner.api.clear().await {
            Ok(snapshot) => {
                self.install(generation, snapshot);
            }
            Err(err) => warn!(error = %err, "Order placed but remote cart clear failed"),
        }
    }

    /// Stop applying remote results. The last known cart stays readable.
    pub fn close(&self) {
        self.lock().closed = true;
        info!("Cart service closed");
    }

    fn apply(
        &self,
        operation: SyncOperation,
        mutate: impl FnOnce(&mut Cart) -> std::result::Result<CartMutation, CartError>,
    ) -> Result<Pending> {
        let mut state = self.lock();
        state.ensure_open()?;
        let inverse = mutate(&mut state.cart)?;
        let generation = if inverse.is_noop() {
            state.generation
        } else {
            state.issue()
        };
        Ok(Pending {
            operation,
            generation,
            inverse,
        })
    }

    async fn settle(&self, pending: Pending, result: ApiResult<Cart>) -> Result<Cart> {
        match result {
            Ok(snapshot) => {
                info!(operation = %pending.operation, "Cart synced");
                Ok(self.install(pending.generation, snapshot))
            }
            Err(err) => {
                warn!(
                    operation = %pending.operation,
                    error = %err,
                    "Cart sync failed, rolling back"
                );
                self.rollback(pending.inverse);
                self.refetch().await;
                Err(SyncError::new(pending.operation, &err).into())
            }
        }
    }

    fn rollback(&self, inverse: CartMutation) {
        let mut state = self.lock();
        if !state.closed {
            state.cart.revert(inverse);
        }
    }

    /// Best-effort authoritative refresh after a failed mutation.
    async fn refetch(&self) {
        let generation = {
            let state = self.lock();
            if state.closed {
                return;
            }
            state.generation
        };

        match self.inner.api.get_cart().await {
            Ok(snapshot) => {
                self.install(generation, snapshot);
            }
            Err(err) => warn!(error = %err, "Cart refetch after rollback failed"),
        }
    }

    /// Install a remote snapshot unless it is stale. Returns the local cart.
    fn install(&self, generation: u64, snapshot: Cart) -> Cart {
        let mut state = self.lock();
        if state.is_current(generation) {
            state.cart.replace_with(snapshot);
        } else {
            warn!(
                generation,
                latest = state.generation,
                closed = state.closed,
                "Discarding stale cart snapshot"
            );
        }
        state.cart.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_confirmed(line_id: &LineId) -> Result<()> {
    if line_id.is_provisional() {
        Err(StoreError::LinePending(line_id.clone()))
    } else {
        Ok(())
    }
}
