//! Integration tests for optimistic favorite toggles.

#![allow(clippy::unwrap_used)]

use basket_core::FavoriteState;
use basket_integration_tests::{Endpoint, FakeBackend, product, session};
use basket_storefront::services::ToggleOutcome;
use basket_storefront::{StoreError, SyncError, SyncOperation};

#[tokio::test]
async fn test_toggle_round_trip() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5);
    let session = session(&backend);
    let favorites = session.favorites();

    assert_eq!(
        favorites.toggle(milk.id).await.unwrap(),
        ToggleOutcome::Applied(FavoriteState::Favorited)
    );
    assert_eq!(backend.favorites(), [milk.id]);

    assert_eq!(
        favorites.toggle(milk.id).await.unwrap(),
        ToggleOutcome::Applied(FavoriteState::NotFavorited)
    );
    assert!(backend.favorites().is_empty());

    // Only the first toggle needed a check.
    assert_eq!(backend.calls_to(Endpoint::CheckFavorite), 1);
}

#[tokio::test]
async fn test_failed_toggle_reverts_and_reports_once() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5);
    backend.favorite(&milk);
    let session = session(&backend);
    let favorites = session.favorites();
    favorites.load_all().await.unwrap();
    backend.fail_next(Endpoint::RemoveFavorite);

    let err = favorites.toggle(milk.id).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Sync(SyncError {
            operation: SyncOperation::RemoveFavorite,
            ..
        })
    ));
    assert_eq!(err.user_message(), "Couldn't remove favorite. Please try again");
    assert_eq!(favorites.state(milk.id), FavoriteState::Favorited);
    assert_eq!(backend.favorites(), [milk.id]);
    assert_eq!(backend.calls_to(Endpoint::RemoveFavorite), 1);
}

#[tokio::test]
async fn test_toggle_while_in_flight_is_ignored() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5).id;
    let session = session(&backend);
    session.favorites().refresh(milk).await.unwrap();
    let gate = backend.hold(Endpoint::AddFavorite);

    let first = tokio::spawn({
        let favorites = session.favorites().clone();
        async move { favorites.toggle(milk).await }
    });
    gate.arrived().await;

    // Optimistically flipped while the add is pending.
    assert_eq!(
        session.favorites().state(milk),
        FavoriteState::Favorited
    );
    assert_eq!(
        session.favorites().toggle(milk).await.unwrap(),
        ToggleOutcome::Ignored
    );

    gate.release();
    assert_eq!(
        first.await.unwrap().unwrap(),
        ToggleOutcome::Applied(FavoriteState::Favorited)
    );
    assert_eq!(backend.calls_to(Endpoint::AddFavorite), 1);
    assert_eq!(backend.calls_to(Endpoint::RemoveFavorite), 0);
}

#[tokio::test]
async fn test_load_all_returns_products_and_resolves_states() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5);
    let bread = product(2, "Bread", 299, 5);
    backend.favorite(&milk);
    let session = session(&backend);
    let favorites = session.favorites();

    let listed = favorites.load_all().await.unwrap();

    assert_eq!(listed, [milk.clone()]);
    assert_eq!(favorites.state(milk.id), FavoriteState::Favorited);
    assert_eq!(favorites.state(bread.id), FavoriteState::Unknown);

    session.teardown().await;
    assert_eq!(favorites.state(milk.id), FavoriteState::Unknown);
}

#[tokio::test]
async fn test_teardown_drops_in_flight_toggle() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5).id;
    let session = session(&backend);
    session.favorites().refresh(milk).await.unwrap();
    let gate = backend.hold(Endpoint::AddFavorite);

    let first = tokio::spawn({
        let favorites = session.favorites().clone();
        async move { favorites.toggle(milk).await }
    });
    gate.arrived().await;

    session.teardown().await;
    assert_eq!(
        session.favorites().toggle(milk).await.unwrap_err(),
        StoreError::SessionClosed
    );

    gate.release();
    assert_eq!(
        first.await.unwrap().unwrap_err(),
        StoreError::SessionClosed
    );
    assert_eq!(session.favorites().state(milk), FavoriteState::Unknown);
    assert_eq!(backend.calls_to(Endpoint::AddFavorite), 1);
    assert_eq!(backend.calls_to(Endpoint::RemoveFavorite), 0);
}

#[tokio::test]
async fn test_clear_keeps_late_response_off_new_state() {
    let backend = FakeBackend::new();
    let milk = product(1, "Milk", 349, 5).id;
    let session = session(&backend);
    let favorites = session.favorites();
    favorites.refresh(milk).await.unwrap();
    let gate = backend.hold(Endpoint::AddFavorite);

    let first = tokio::spawn({
        let favorites = favorites.clone();
        async move { favorites.toggle(milk).await }
    });
    gate.arrived().await;

    // The held add already reached the server, so the fresh check sees it
    // and the second toggle removes it again.
    favorites.clear();
    assert_eq!(
        favorites.toggle(milk).await.unwrap(),
        ToggleOutcome::Applied(FavoriteState::NotFavorited)
    );

    gate.release();
    assert_eq!(first.await.unwrap().unwrap(), ToggleOutcome::Discarded);
    assert_eq!(favorites.state(milk), FavoriteState::NotFavorited);
    assert!(backend.favorites().is_empty());
}
