//! Integration tests for the checkout wizard and order submission.

#![allow(clippy::unwrap_used)]

use basket_core::checkout::WizardState;
use basket_core::{CheckoutStep, DeliveryType, OrderId, PaymentMethod};
use basket_integration_tests::{Endpoint, FakeBackend, product, session};
use basket_storefront::{FailureReason, SessionContext, StoreError, SubmissionError};
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn fill_address(session: &SessionContext) {
    session
        .checkout()
        .update_draft(|draft| {
            draft.address.full_name = "Grace Hopper".to_string();
            draft.address.address_line1 = "200 Pine St".to_string();
            draft.address.city = "Arlington".to_string();
            draft.address.state = "VA".to_string();
            draft.address.zip_code = "22201-1234".to_string();
        })
        .unwrap();
}

/// Cart with 2 x $3.49 milk, checkout advanced to Review.
async fn ready_for_review(backend: &std::sync::Arc<FakeBackend>) -> SessionContext {
    let milk = product(1, "Milk", 349, 5);
    backend.stock(&milk);
    let session = session(backend);
    session.cart().add_item(milk, 2).await.unwrap();

    fill_address(&session);
    session
        .checkout()
        .update_draft(|draft| {
            draft.select_delivery(DeliveryType::Standard);
            draft.select_payment(PaymentMethod::Paypal);
        })
        .unwrap();
    for _ in 0..3 {
        session.checkout().next_on(today()).unwrap();
    }
    assert_eq!(session.checkout().current_step(), Some(CheckoutStep::Review));
    session
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_scheduled_delivery_needs_future_date_and_slot() {
    let backend = FakeBackend::new();
    let session = session(&backend);
    let checkout = session.checkout();
    fill_address(&session);
    checkout.next_on(today()).unwrap();

    checkout
        .update_draft(|draft| {
            draft.select_delivery(DeliveryType::Scheduled);
            draft.scheduled_date = Some(today());
        })
        .unwrap();
    let StoreError::Validation(err) = checkout.next_on(today()).unwrap_err() else {
        panic!("expected a validation error");
    };
    assert_eq!(
        err.message_for("scheduled_date"),
        Some("Delivery date must be in the future")
    );
    assert!(err.message_for("scheduled_time_start").is_some());
    assert_eq!(checkout.current_step(), Some(CheckoutStep::Delivery));

    checkout
        .update_draft(|draft| {
            draft.scheduled_date = today().succ_opt();
            draft.scheduled_time_start = Some("12:00".to_string());
        })
        .unwrap();
    assert_eq!(checkout.next_on(today()).unwrap(), CheckoutStep::Payment);
}

#[tokio::test]
async fn test_edit_jumps_back_and_keeps_draft() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;
    let checkout = session.checkout();

    checkout.edit(CheckoutStep::Delivery).unwrap();
    assert_eq!(checkout.current_step(), Some(CheckoutStep::Delivery));
    assert_eq!(checkout.draft().delivery_type, Some(DeliveryType::Standard));

    // Can't jump forward past unvalidated steps.
    assert!(matches!(
        checkout.edit(CheckoutStep::Review).unwrap_err(),
        StoreError::Navigation(_)
    ));
}

#[tokio::test]
async fn test_pricing_tracks_cart_and_delivery() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;

    let pricing = session.checkout().pricing();

    // 6.98 + 8% tax (0.56) + 5.99 standard delivery.
    assert_eq!(pricing.subtotal, Decimal::new(698, 2));
    assert_eq!(pricing.tax, Decimal::new(56, 2));
    assert_eq!(pricing.delivery_fee, Decimal::new(599, 2));
    assert_eq!(pricing.total, Decimal::new(1353, 2));
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_failed_submission_can_be_retried() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;
    let checkout = session.checkout();
    let draft = checkout.draft();
    backend.fail_next(Endpoint::CreateOrder);

    let err = checkout.submit_on(today()).await.unwrap_err();

    assert_eq!(
        err,
        StoreError::Submission(SubmissionError::Failed(FailureReason::Server(503)))
    );
    assert!(err.is_retryable());
    assert_eq!(checkout.state(), WizardState::InProgress(CheckoutStep::Review));
    assert_eq!(checkout.draft(), draft);
    assert_eq!(session.cart().snapshot().item_count(), 2);
    assert!(backend.orders().is_empty());

    let order_id = checkout.submit_on(today()).await.unwrap();

    assert_eq!(order_id, OrderId::new(1001));
    assert_eq!(checkout.state(), WizardState::Submitted(order_id));
    assert!(session.cart().snapshot().is_empty());
    assert!(backend.cart_lines().is_empty());

    let orders = backend.orders();
    assert_eq!(orders.len(), 1);
    let order = orders.first().unwrap();
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.delivery.delivery_type, DeliveryType::Standard);
    assert_eq!(order.payment_method, PaymentMethod::Paypal);
    assert_eq!(order.pricing.total, Decimal::new(1353, 2));
}

#[tokio::test]
async fn test_second_submit_while_pending_is_rejected() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;
    let gate = backend.hold(Endpoint::CreateOrder);

    let first = tokio::spawn({
        let checkout = session.checkout().clone();
        async move { checkout.submit_on(today()).await }
    });
    gate.arrived().await;

    assert_eq!(session.checkout().state(), WizardState::Submitting);
    assert_eq!(
        session.checkout().submit_on(today()).await.unwrap_err(),
        StoreError::Submission(SubmissionError::InProgress)
    );
    assert!(session.checkout().update_draft(|_| ()).is_err());
    assert_eq!(
        session.checkout().restart().unwrap_err(),
        StoreError::Submission(SubmissionError::InProgress)
    );

    gate.release();
    first.await.unwrap().unwrap();
    assert_eq!(backend.orders().len(), 1);
}

#[tokio::test]
async fn test_submission_revalidates_scheduled_date() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;
    let checkout = session.checkout();
    let tomorrow = today().succ_opt().unwrap();

    checkout.edit(CheckoutStep::Delivery).unwrap();
    checkout
        .update_draft(|draft| {
            draft.select_delivery(DeliveryType::Scheduled);
            draft.scheduled_date = Some(tomorrow);
            draft.scheduled_time_start = Some("09:00".to_string());
        })
        .unwrap();
    checkout.next_on(today()).unwrap();
    checkout.next_on(today()).unwrap();

    // Submitted a day late: the chosen date is no longer in the future.
    let StoreError::Validation(err) = checkout.submit_on(tomorrow).await.unwrap_err() else {
        panic!("expected a validation error");
    };
    assert_eq!(err.step, CheckoutStep::Delivery);
    assert_eq!(checkout.state(), WizardState::InProgress(CheckoutStep::Review));
    assert_eq!(backend.calls_to(Endpoint::CreateOrder), 0);
}

#[tokio::test]
async fn test_teardown_ends_checkout_without_ordering() {
    let backend = FakeBackend::new();
    let session = ready_for_review(&backend).await;

    session.teardown().await;

    assert_eq!(
        session.checkout().submit_on(today()).await.unwrap_err(),
        StoreError::SessionClosed
    );
    assert_eq!(
        session.checkout().next_on(today()).unwrap_err(),
        StoreError::SessionClosed
    );
    assert_eq!(backend.calls_to(Endpoint::CreateOrder), 0);
    assert!(backend.orders().is_empty());
    assert_eq!(
        session.checkout().state(),
        WizardState::InProgress(CheckoutStep::Review)
    );
}
