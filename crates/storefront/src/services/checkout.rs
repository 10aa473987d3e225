//! Checkout session: wizard navigation and order submission.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use basket_core::{
    CheckoutDraft, CheckoutStep, CheckoutWizard, OrderId, PriceSummary, checkout::WizardState,
};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use super::cart::CartService;
use crate::api::OrderApi;
use crate::error::{FailureReason, Result, StoreError, SubmissionError};

/// Drives one checkout against the session cart.
///
/// Cheap to clone; clones share the same wizard. The checkout lives as long
/// as its cart: once the cart is closed every call that would change the
/// wizard fails with [`StoreError::SessionClosed`].
#[derive(Clone)]
pub struct CheckoutService {
    inner: Arc<CheckoutInner>,
}

struct CheckoutInner {
    wizard: Mutex<CheckoutWizard>,
    cart: CartService,
    orders: Arc<dyn OrderApi>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(cart: CartService, orders: Arc<dyn OrderApi>) -> Self {
        Self {
            inner: Arc::new(CheckoutInner {
                wizard: Mutex::new(CheckoutWizard::new()),
                cart,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> WizardState {
        self.lock().state()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<CheckoutStep> {
        self.lock().current_step()
    }

    /// Copy of the draft.
    #[must_use]
    pub fn draft(&self) -> CheckoutDraft {
        self.lock().draft().clone()
    }

    /// Edit the draft in place.
    ///
    /// # Errors
    ///
    /// Fails while an order is being submitted or after it was placed.
    pub fn update_draft<R>(&self, edit: impl FnOnce(&mut CheckoutDraft) -> R) -> Result<R> {
        self.ensure_open()?;
        let mut wizard = self.lock();
        Ok(edit(wizard.draft_mut()?))
    }

    /// Totals for the current cart and delivery choice.
    #[must_use]
    pub fn pricing(&self) -> PriceSummary {
        let cart = self.inner.cart.snapshot();
        self.lock().pricing(&cart)
    }

    /// Validate the current step without moving.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`](crate::StoreError::Validation) with the failing fields.
    pub fn validate_current(&self) -> Result<()> {
        self.ensure_open()?;
        Ok(self.lock().validate_current(today())?)
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::next_on`].
    pub fn next(&self) -> Result<CheckoutStep> {
        self.next_on(today())
    }

    /// Advance one step, checking dates against `today`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`](crate::StoreError::Validation) when the
    /// current step fails; the wizard stays put.
    pub fn next_on(&self, today: NaiveDate) -> Result<CheckoutStep> {
        self.ensure_open()?;
        let step = self.lock().next_on(today)?;
        info!(%step, "Checkout advanced");
        Ok(step)
    }

    /// Jump back to an earlier step.
    ///
    /// # Errors
    ///
    /// [`StoreError::Navigation`](crate::StoreError::Navigation) for a step
    /// ahead of the current one.
    pub fn edit(&self, step: CheckoutStep) -> Result<()> {
        self.ensure_open()?;
        Ok(self.lock().edit(step)?)
    }

    /// Go back one step.
    ///
    /// # Errors
    ///
    /// Fails only when the checkout is no longer editable.
    pub fn back(&self) -> Result<CheckoutStep> {
        self.ensure_open()?;
        Ok(self.lock().back()?)
    }

    /// Place the order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutService::submit_on`].
    pub async fn submit(&self) -> Result<OrderId> {
        self.submit_on(today()).await
    }

    /// Validate everything, create the order and empty the cart.
    ///
    /// On failure the wizard returns to Review with the draft and cart
    /// untouched, so the same call can simply be retried.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::InProgress`] while another submission is pending.
    /// - [`StoreError::Validation`](crate::StoreError::Validation) for the
    ///   first step that no longer validates.
    /// - [`SubmissionError::Failed`] if the order endpoint fails.
    /// - [`StoreError::SessionClosed`] after teardown; no order is sent.
    #[instrument(skip(self))]
    pub async fn submit_on(&self, today: NaiveDate) -> Result<OrderId> {
        self.ensure_open()?;
        let cart = self.inner.cart.snapshot();
        let request = self.lock().begin_submit_on(&cart, today)?;
        info!(
            lines = request.lines.len(),
            total = %request.pricing.total,
            "Submitting order"
        );

        match self.inner.orders.create_order(&request).await {
            Ok(order_id) => {
                self.lock().complete_submit(order_id)?;
                info!(%order_id, "Order placed");
                self.inner.cart.discard_after_order().await;
                Ok(order_id)
            }
            Err(err) => {
                warn!(error = %err, "Order submission failed");
                self.lock().abort_submit()?;
                Err(SubmissionError::Failed(FailureReason::from(&err)).into())
            }
        }
    }

    /// Start a fresh checkout.
    ///
    /// # Errors
    ///
    /// [`SubmissionError::InProgress`] while a submission is pending.
    pub fn restart(&self) -> Result<()> {
        self.ensure_open()?;
        let mut wizard = self.lock();
        if wizard.state() == WizardState::Submitting {
            return Err(SubmissionError::InProgress.into());
        }
        *wizard = CheckoutWizard::new();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.cart.is_closed() {
            Err(StoreError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, CheckoutWizard> {
        self.inner
            .wizard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
