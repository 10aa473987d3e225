//! Basket Core - Cart, checkout and basket alignment domain logic.
//!
//! This crate holds the stateful and algorithmic pieces of the storefront:
//! - [`cart`] - Stock-aware shopping cart with invertible mutations
//! - [`checkout`] - Four-step checkout wizard with declarative validation
//! - [`pricing`] - Subtotal, tax, delivery fee and total derivation
//! - [`alignment`] - Predicted vs. actual basket alignment for comparison views
//! - [`favorite`] - Optimistic favorite toggle state machine
//!
//! # Architecture
//!
//! The core crate contains only types and pure state machines - no I/O, no
//! HTTP clients, no async runtime. Remote synchronization lives in
//! `basket-storefront`, which drives these types through optimistic
//! apply / commit / revert cycles.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money utilities, products and checkout enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod alignment;
pub mod cart;
pub mod checkout;
pub mod favorite;
pub mod pricing;
pub mod types;

pub use alignment::{AlignedRow, Alignment, PredictionComparison, RowBadge, align_baskets};
pub use cart::{Cart, CartError, CartItem, CartMutation};
pub use checkout::{
    CheckoutDraft, CheckoutStep, CheckoutWizard, FieldError, OrderRequest, ValidationError,
    WizardError,
};
pub use favorite::{FavoriteError, FavoriteState, FavoriteToggle, PendingToggle};
pub use pricing::{DeliveryOption, PriceSummary, TAX_RATE};
pub use types::*;
