//! Session services driving the core state machines against remote ports.
//!
//! # Services
//!
//! - `cart` - Optimistic cart mutations with rollback and stale-response guards
//! - `checkout` - Wizard navigation and order submission
//! - `favorites` - Optimistic favorite toggles
//! - `predictions` - Cached predicted vs. actual basket comparison

pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod predictions;

#[cfg(test)]
pub(crate) mod testing;

pub use cart::CartService;
pub use checkout::CheckoutService;
pub use favorites::{FavoritesService, ToggleOutcome};
pub use predictions::{ComparisonReport, PredictionService};
