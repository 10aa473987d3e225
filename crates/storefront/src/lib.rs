//! Basket Storefront - session layer over the basket engine.
//!
//! Drives the pure state machines in `basket-core` against the remote
//! storefront API:
//!
//! - [`api`] - Remote collaborator ports and their REST implementation
//! - [`services`] - Optimistic cart sync, checkout, favorites and predictions
//! - [`state`] - Per-session context with explicit init and teardown
//! - [`config`] - Environment configuration
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - User-facing error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::{ConfigError, LogFormat, StorefrontConfig};
pub use error::{FailureReason, Result, StoreError, SubmissionError, SyncError, SyncOperation};
pub use state::{Backends, SessionContext};
