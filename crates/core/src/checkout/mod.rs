//! Multi-step checkout: draft, validation schema, wizard and order request.
//!
//! # Modules
//!
//! - [`draft`] - The mutable checkout form
//! - [`schema`] - Declarative per-step field rules
//! - [`wizard`] - Step navigation and two-phase submission
//! - [`order`] - Order-creation request built at submission

pub mod draft;
pub mod order;
pub mod schema;
pub mod wizard;

pub use draft::{CheckoutDraft, ShippingAddress};
pub use order::{DeliverySelection, OrderLine, OrderRequest};
pub use schema::{FieldError, FieldRule, TIME_SLOTS, ValidationError, validate_step};
pub use wizard::{CheckoutStep, CheckoutWizard, WizardError, WizardState};
