//! Core types for the basket engine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use id::*;
pub use price::{CurrencyCode, Price, clamp_quantity, discount_percent, format_price, round_money};
pub use product::Product;
pub use status::*;
