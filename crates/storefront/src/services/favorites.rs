//! Optimistic favorite toggles, one per product.
//!
//! A toggle flips the local state before the remote add/remove is sent and
//! reverts it if the call fails. A toggle requested while another one for the
//! same product is still in flight is ignored.
//!
//! Every toggle remembers the epoch it started in. Clearing or closing the
//! service starts a new epoch, so a response arriving afterwards is dropped
//! instead of being settled onto whatever entry replaced the old one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use basket_core::{FavoriteError, FavoriteState, FavoriteToggle, Product, ProductId, UserId};
use tracing::{debug, info, instrument, warn};

use crate::api::FavoritesApi;
use crate::error::{Result, StoreError, SyncError, SyncOperation};

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote store accepted the change; holds the new state.
    Applied(FavoriteState),
    /// Another toggle for the product was still in flight.
    Ignored,
    /// Local state was cleared before the remote answered; nothing was applied.
    Discarded,
}

/// Favorites of the session user.
#[derive(Clone)]
pub struct FavoritesService {
    inner: Arc<FavoritesInner>,
}

struct FavoritesInner {
    api: Arc<dyn FavoritesApi>,
    user_id: UserId,
    state: Mutex<FavoritesState>,
}

#[derive(Default)]
struct FavoritesState {
    toggles: HashMap<ProductId, FavoriteToggle>,
    /// Bumped whenever `toggles` is thrown away.
    epoch: u64,
    closed: bool,
}

impl FavoritesState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn reset(&mut self) {
        self.toggles.clear();
        self.epoch += 1;
    }
}

impl FavoritesService {
    #[must_use]
    pub fn new(api: Arc<dyn FavoritesApi>, user_id: UserId) -> Self {
        Self {
            inner: Arc::new(FavoritesInner {
                api,
                user_id,
                state: Mutex::new(FavoritesState::default()),
            }),
        }
    }

    /// Local state for a product, `Unknown` until checked or listed.
    #[must_use]
    pub fn state(&self, product_id: ProductId) -> FavoriteState {
        self.lock()
            .toggles
            .get(&product_id)
            .map_or(FavoriteState::Unknown, FavoriteToggle::state)
    }

    /// Ask the remote store whether a product is a favorite.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sync`](crate::StoreError::Sync) if the check fails,
    /// [`StoreError::SessionClosed`] after [`FavoritesService::close`].
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn refresh(&self, product_id: ProductId) -> Result<FavoriteState> {
        let epoch = self.open_epoch()?;
        let favorited = self
            .inner
            .api
            .check(self.inner.user_id, product_id)
            .await
            .map_err(|err| {
                warn!(error = %err, "Favorite check failed");
                SyncError::new(SyncOperation::CheckFavorite, &err)
            })?;

        let mut state = self.lock();
        state.ensure_open()?;
        if state.epoch != epoch {
            debug!("Favorites cleared during check, dropping answer");
            return Ok(FavoriteState::Unknown);
        }
        let toggle = state.toggles.entry(product_id).or_default();
        toggle.resolve(favorited);
        Ok(toggle.state())
    }

    /// Fetch every favorite and resolve known products against the list.
    ///
    /// # Errors
    ///
    /// [`StoreError::Sync`](crate::StoreError::Sync) if the list fails,
    /// [`StoreError::SessionClosed`] after [`FavoritesService::close`].
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn load_all(&self) -> Result<Vec<Product>> {
        let epoch = self.open_epoch()?;
        let products = self
            .inner
            .api
            .list(self.inner.user_id)
            .await
            .map_err(|err| {
                warn!(error = %err, "Favorites list failed");
                SyncError::new(SyncOperation::ListFavorites, &err)
            })?;

        let listed: HashSet<ProductId> = products.iter().map(|product| product.id).collect();
        let mut state = self.lock();
        state.ensure_open()?;
        if state.epoch == epoch {
            for (product_id, toggle) in &mut state.toggles {
                toggle.resolve(listed.contains(product_id));
            }
            for product_id in &listed {
                state
                    .toggles
                    .entry(*product_id)
                    .or_insert_with(|| FavoriteToggle::resolved(true));
            }
        }

        info!(count = products.len(), "Favorites loaded");
        Ok(products)
    }

    /// Flip a product's favorite state.
    ///
    /// An unknown state is checked remotely first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Sync`](crate::StoreError::Sync) if the check or the
    ///   add/remove fails. A failed add/remove is reverted before returning.
    /// - [`StoreError::SessionClosed`] after [`FavoritesService::close`],
    ///   including when the service closed while the call was in flight.
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn toggle(&self, product_id: ProductId) -> Result<ToggleOutcome> {
        if self.state(product_id) == FavoriteState::Unknown {
            self.refresh(product_id).await?;
        }

        let (epoch, ticket) = {
            let mut state = self.lock();
            state.ensure_open()?;
            let epoch = state.epoch;
            match state.toggles.entry(product_id).or_default().begin() {
                Ok(ticket) => (epoch, ticket),
                Err(FavoriteError::InFlight) => {
                    debug!("Favorite toggle already in flight, ignoring");
                    return Ok(ToggleOutcome::Ignored);
                }
                Err(err) => return Err(err.into()),
            }
        };

        let (operation, result) = if ticket.adds() {
            let result = self.inner.api.add(self.inner.user_id, product_id).await;
            (SyncOperation::AddFavorite, result)
        } else {
            let result = self.inner.api.remove(self.inner.user_id, product_id).await;
            (SyncOperation::RemoveFavorite, result)
        };

        let succeeded = result.is_ok();
        let settled = {
            let mut state = self.lock();
            if state.closed || state.epoch != epoch {
                warn!(
                    succeeded,
                    closed = state.closed,
                    "Discarding stale favorite response"
                );
                if state.closed {
                    return Err(StoreError::SessionClosed);
                }
                None
            } else {
                state
                    .toggles
                    .get_mut(&product_id)
                    .map(|toggle| toggle.settle(ticket, succeeded))
            }
        };
        let Some(state) = settled else {
            return Ok(ToggleOutcome::Discarded);
        };

        match result {
            Ok(()) => {
                info!(?state, "Favorite toggled");
                Ok(ToggleOutcome::Applied(state))
            }
            Err(err) => {
                warn!(error = %err, ?state, "Favorite toggle failed, reverted");
                Err(SyncError::new(operation, &err).into())
            }
        }
    }

    /// Forget every known state.
    ///
    /// Toggles still in flight are dropped when their response arrives.
    pub fn clear(&self) {
        self.lock().reset();
    }

    /// Forget every known state and reject further calls.
    pub fn close(&self) {
        let mut state = self.lock();
        state.reset();
        state.closed = true;
        info!("Favorites service closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn open_epoch(&self) -> Result<u64> {
        let state = self.lock();
        state.ensure_open()?;
        Ok(state.epoch)
    }

    fn lock(&self) -> MutexGuard<'_, FavoritesState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use crate::services::testing::{Scripted, unavailable};

    fn service(api: &Arc<Scripted>) -> FavoritesService {
        FavoritesService::new(Arc::clone(api) as Arc<dyn FavoritesApi>, UserId::new(1))
    }

    #[tokio::test]
    async fn test_unknown_is_checked_before_toggling() {
        let api = Arc::new(Scripted::default());
        api.flag(Ok(false));
        api.flag(Ok(true));
        let favorites = service(&api);
        let milk = ProductId::new(3);

        let outcome = favorites.toggle(milk).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Applied(FavoriteState::Favorited));
        assert_eq!(favorites.state(milk), FavoriteState::Favorited);
        assert_eq!(api.calls(), ["check_favorite", "add_favorite"]);
    }

    #[tokio::test]
    async fn test_failed_toggle_reverts() {
        let api = Arc::new(Scripted::default());
        api.flag(Ok(true));
        api.flag(Err(unavailable()));
        let favorites = service(&api);
        let milk = ProductId::new(3);

        let err = favorites.toggle(milk).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::Sync(SyncError {
                operation: SyncOperation::RemoveFavorite,
                reason: FailureReason::Server(503),
            })
        );
        assert_eq!(favorites.state(milk), FavoriteState::Favorited);
    }

    #[tokio::test]
    async fn test_failed_check_leaves_state_unknown() {
        let api = Arc::new(Scripted::default());
        let favorites = service(&api);

        let err = favorites.toggle(ProductId::new(3)).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Sync(SyncError {
                operation: SyncOperation::CheckFavorite,
                ..
            })
        ));
        assert_eq!(favorites.state(ProductId::new(3)), FavoriteState::Unknown);
    }

    #[tokio::test]
    async fn test_load_all_resolves_unlisted_products() {
        let api = Arc::new(Scripted::default());
        api.flag(Ok(true));
        let favorites = service(&api);
        let milk = ProductId::new(3);
        favorites.refresh(milk).await.unwrap();

        // The fake lists no favorites.
        assert!(favorites.load_all().await.unwrap().is_empty());
        assert_eq!(favorites.state(milk), FavoriteState::NotFavorited);

        favorites.clear();
        assert_eq!(favorites.state(milk), FavoriteState::Unknown);
        assert!(!favorites.is_closed());
    }

    #[tokio::test]
    async fn test_closed_service_rejects_calls() {
        let api = Arc::new(Scripted::default());
        api.flag(Ok(true));
        let favorites = service(&api);
        let milk = ProductId::new(3);
        favorites.refresh(milk).await.unwrap();

        favorites.close();

        assert!(favorites.is_closed());
        assert_eq!(favorites.state(milk), FavoriteState::Unknown);
        assert_eq!(
            favorites.toggle(milk).await.unwrap_err(),
            StoreError::SessionClosed
        );
        assert_eq!(
            favorites.refresh(milk).await.unwrap_err(),
            StoreError::SessionClosed
        );
        assert_eq!(
            favorites.load_all().await.unwrap_err(),
            StoreError::SessionClosed
        );
        assert_eq!(api.calls(), ["check_favorite"]);
    }
}
