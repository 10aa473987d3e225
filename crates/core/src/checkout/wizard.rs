//! Checkout wizard state machine.
//!
//! ```text
//! Address -> Delivery -> Payment -> Review --submit--> Submitting --ok--> Submitted
//!    ^__________^___________^_________|  (edit)            |
//!                                      ^------- failed -----'
//! ```
//!
//! Forward moves go one step at a time and only when the current step
//! validates. Backward moves (`edit`) go to any earlier step without
//! validation. Submission is a two-phase operation so the caller can await
//! the remote order call in between.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::draft::CheckoutDraft;
use super::order::OrderRequest;
use super::schema::{ValidationError, validate_step};
use crate::cart::Cart;
use crate::pricing::PriceSummary;
use crate::types::OrderId;

/// Wizard steps, numbered 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Address = 1,
    Delivery = 2,
    Payment = 3,
    Review = 4,
}

impl CheckoutStep {
    /// Steps in order.
    pub const ALL: [Self; 4] = [Self::Address, Self::Delivery, Self::Payment, Self::Review];

    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Step for a 1-based number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Address),
            2 => Some(Self::Delivery),
            3 => Some(Self::Payment),
            4 => Some(Self::Review),
            _ => None,
        }
    }

    /// The following step, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address => write!(f, "Address"),
            Self::Delivery => write!(f, "Delivery"),
            Self::Payment => write!(f, "Payment"),
            Self::Review => write!(f, "Review"),
        }
    }
}

/// Where the wizard is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    InProgress(CheckoutStep),
    /// Order request handed out, awaiting the remote result.
    Submitting,
    Submitted(OrderId),
}

/// Errors raised by wizard navigation and submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// The current step's fields did not validate.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Jumping forward past the current step.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: CheckoutStep,
        to: CheckoutStep,
    },

    /// `next()` on Review; the order is submitted instead.
    #[error("review is the last step")]
    AtFinalStep,

    /// Submitting from a step other than Review.
    #[error("order can only be submitted from review (currently on {0})")]
    NotAtReview(CheckoutStep),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A submission is awaiting its remote result.
    #[error("order submission already in progress")]
    SubmissionInFlight,

    /// The order was already placed.
    #[error("order already submitted")]
    AlreadySubmitted,
}

/// The checkout wizard: current state plus the draft being filled in.
#[derive(Debug, Clone)]
pub struct CheckoutWizard {
    state: WizardState,
    draft: CheckoutDraft,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    /// Start a fresh checkout at the address step.
    #[must_use]
    pub fn new() -> Self {
        Self::with_draft(CheckoutDraft::default())
    }

    /// Start at the address step with a prefilled draft (e.g. a saved address).
    #[must_use]
    pub const fn with_draft(draft: CheckoutDraft) -> Self {
        Self {
            state: WizardState::InProgress(CheckoutStep::Address),
            draft,
        }
    }

    #[must_use]
    pub const fn state(&self) -> WizardState {
        self.state
    }

    /// Current step; Review while a submission is in flight, `None` once submitted.
    #[must_use]
    pub const fn current_step(&self) -> Option<CheckoutStep> {
        match self.state {
            WizardState::InProgress(step) => Some(step),
            WizardState::Submitting => Some(CheckoutStep::Review),
            WizardState::Submitted(_) => None,
        }
    }

    /// Order ID once submitted.
    #[must_use]
    pub const fn submitted_order(&self) -> Option<OrderId> {
        match self.state {
            WizardState::Submitted(order_id) => Some(order_id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    /// Mutable access to the draft while the checkout is editable.
    ///
    /// # Errors
    ///
    /// Fails while a submission is in flight or after the order was placed.
    pub fn draft_mut(&mut self) -> Result<&mut CheckoutDraft, WizardError> {
        self.in_progress()?;
        Ok(&mut self.draft)
    }

    /// Totals for the live cart and the current delivery choice.
    #[must_use]
    pub fn pricing(&self, cart: &Cart) -> PriceSummary {
        PriceSummary::compute(cart, self.draft.delivery_type)
    }

    /// Validate the current step without moving.
    ///
    /// # Errors
    ///
    /// Returns the failing fields, or a state error if not in progress.
    pub fn validate_current(&self, today: NaiveDate) -> Result<(), WizardError> {
        let step = self.in_progress()?;
        validate_step(&self.draft, step, today)?;
        Ok(())
    }

    /// Advance one step using today's local date for date checks.
    ///
    /// # Errors
    ///
    /// See [`CheckoutWizard::next_on`].
    pub fn next(&mut self) -> Result<CheckoutStep, WizardError> {
        self.next_on(chrono::Local::now().date_naive())
    }

    /// Advance one step if the current step validates.
    ///
    /// # Errors
    ///
    /// - [`WizardError::Validation`] if the current step's fields fail; the
    ///   wizard does not move.
    /// - [`WizardError::AtFinalStep`] on Review.
    pub fn next_on(&mut self, today: NaiveDate) -> Result<CheckoutStep, WizardError> {
        let step = self.in_progress()?;
        let next = step.next().ok_or(WizardError::AtFinalStep)?;
        validate_step(&self.draft, step, today)?;
        self.state = WizardState::InProgress(next);
        Ok(next)
    }

    /// Go back to an earlier (or the current) step without validation.
    ///
    /// # Errors
    ///
    /// [`WizardError::InvalidTransition`] if `step` is ahead of the current step.
    pub fn edit(&mut self, step: CheckoutStep) -> Result<(), WizardError> {
        let current = self.in_progress()?;
        if step > current {
            return Err(WizardError::InvalidTransition {
                from: current,
                to: step,
            });
        }
        self.state = WizardState::InProgress(step);
        Ok(())
    }

    /// Go back one step. No-op on the address step.
    ///
    /// # Errors
    ///
    /// Fails only when the wizard is not in progress.
    pub fn back(&mut self) -> Result<CheckoutStep, WizardError> {
        let current = self.in_progress()?;
        let target = current.previous().unwrap_or(current);
        self.edit(target)?;
        Ok(target)
    }

    /// Start submitting using today's local date for date checks.
    ///
    /// # Errors
    ///
    /// See [`CheckoutWizard::begin_submit_on`].
    pub fn begin_submit(&mut self, cart: &Cart) -> Result<OrderRequest, WizardError> {
        self.begin_submit_on(cart, chrono::Local::now().date_naive())
    }

    /// Validate the whole draft, build the order request and enter `Submitting`.
    ///
    /// Earlier steps are re-validated since edits may have invalidated them.
    /// On error the wizard stays on Review with the draft untouched.
    ///
    /// # Errors
    ///
    /// - [`WizardError::NotAtReview`] from any other step.
    /// - [`WizardError::EmptyCart`] when there is nothing to order.
    /// - [`WizardError::Validation`] for the first step that fails.
    pub fn begin_submit_on(
        &mut self,
        cart: &Cart,
        today: NaiveDate,
    ) -> Result<OrderRequest, WizardError> {
        let step = self.in_progress()?;
        if step != CheckoutStep::Review {
            return Err(WizardError::NotAtReview(step));
        }
        if cart.is_empty() {
            return Err(WizardError::EmptyCart);
        }
        for step in CheckoutStep::ALL {
            validate_step(&self.draft, step, today)?;
        }

        let request = OrderRequest::build(cart, &self.draft)?;
        self.state = WizardState::Submitting;
        Ok(request)
    }

    /// The order was created. The draft is discarded.
    ///
    /// # Errors
    ///
    /// Fails unless a submission is in flight.
    pub fn complete_submit(&mut self, order_id: OrderId) -> Result<(), WizardError> {
        self.submitting()?;
        self.state = WizardState::Submitted(order_id);
        self.draft = CheckoutDraft::default();
        Ok(())
    }

    /// The order call failed. Back to Review with the draft preserved.
    ///
    /// # Errors
    ///
    /// Fails unless a submission is in flight.
    pub fn abort_submit(&mut self) -> Result<(), WizardError> {
        self.submitting()?;
        self.state = WizardState::InProgress(CheckoutStep::Review);
        Ok(())
    }

    const fn in_progress(&self) -> Result<CheckoutStep, WizardError> {
        match self.state {
            WizardState::InProgress(step) => Ok(step),
            WizardState::Submitting => Err(WizardError::SubmissionInFlight),
            WizardState::Submitted(_) => Err(WizardError::AlreadySubmitted),
        }
    }

    const fn submitting(&self) -> Result<(), WizardError> {
        match self.state {
            WizardState::Submitting => Ok(()),
            WizardState::Submitted(_) => Err(WizardError::AlreadySubmitted),
            WizardState::InProgress(step) => Err(WizardError::NotAtReview(step)),
        }
    }
}
