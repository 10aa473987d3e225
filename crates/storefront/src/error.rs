//! User-facing error taxonomy.
//!
//! Every service returns [`StoreError`]. Transport failures are caught at the
//! mutation boundary and classified into a [`FailureReason`], so raw
//! `reqwest` errors and status codes never reach callers uncategorized.

use std::fmt;

use basket_core::{CartError, FavoriteError, LineId, ProductId, ValidationError, WizardError};
use thiserror::Error;

use crate::api::ApiError;

/// Remote operation that failed to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    LoadCart,
    AddItem,
    UpdateItem,
    RemoveItem,
    ClearCart,
    CheckFavorite,
    ListFavorites,
    AddFavorite,
    RemoveFavorite,
    FetchPredictions,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadCart => "load cart",
            Self::AddItem => "add to cart",
            Self::UpdateItem => "update cart item",
            Self::RemoveItem => "remove cart item",
            Self::ClearCart => "clear cart",
            Self::CheckFavorite => "check favorite",
            Self::ListFavorites => "list favorites",
            Self::AddFavorite => "add favorite",
            Self::RemoveFavorite => "remove favorite",
            Self::FetchPredictions => "fetch predictions",
        };
        f.write_str(name)
    }
}

/// Why a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Connection failed or the request could not be sent.
    Network,
    /// No response within the configured timeout.
    Timeout,
    /// Rate limited; retry after the given number of seconds.
    RateLimited { retry_after: u64 },
    /// 5xx from the server.
    Server(u16),
    /// 4xx from the server, with its message.
    Rejected { status: u16, message: String },
    /// The response body could not be decoded.
    Malformed,
}

impl From<&ApiError> for FailureReason {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Http(e) if e.is_timeout() => Self::Timeout,
            ApiError::Http(e) if e.is_decode() => Self::Malformed,
            ApiError::Http(_) | ApiError::InvalidUrl(_) => Self::Network,
            ApiError::Status { status, .. } if *status >= 500 => Self::Server(*status),
            ApiError::Status { status, message } => Self::Rejected {
                status: *status,
                message: message.clone(),
            },
            ApiError::RateLimited(retry_after) => Self::RateLimited {
                retry_after: *retry_after,
            },
            ApiError::Parse(_) => Self::Malformed,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::RateLimited { retry_after } => {
                write!(f, "rate limited, retry after {retry_after}s")
            }
            Self::Server(status) => write!(f, "server error ({status})"),
            Self::Rejected { status, message } => write!(f, "rejected ({status}): {message}"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

impl FailureReason {
    /// Whether repeating the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// A remote mutation or fetch failed. Optimistic changes were rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {reason}")]
pub struct SyncError {
    pub operation: SyncOperation,
    pub reason: FailureReason,
}

impl SyncError {
    #[must_use]
    pub fn new(operation: SyncOperation, err: &ApiError) -> Self {
        Self {
            operation,
            reason: FailureReason::from(err),
        }
    }
}

/// Order creation did not go through. Draft and cart are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Another submission is awaiting its result.
    #[error("order submission already in progress")]
    InProgress,

    /// The order endpoint failed.
    #[error("order submission failed: {0}")]
    Failed(FailureReason),
}

/// Storefront error returned by every service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Checkout fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Quantity exceeds tracked stock. Nothing was sent.
    #[error("only {available} of product {product_id} in stock (requested {requested})")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Remote sync failed and the local change was rolled back.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Order submission failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Wizard navigation not allowed from the current state.
    #[error(transparent)]
    Navigation(WizardError),

    /// Other local cart errors.
    #[error(transparent)]
    Cart(CartError),

    /// Favorite toggle could not start.
    #[error(transparent)]
    Favorite(#[from] FavoriteError),

    /// The line hasn't been confirmed by the remote cart yet.
    #[error("cart line {0} is still being added")]
    LinePending(LineId),

    /// The session was torn down.
    #[error("session closed")]
    SessionClosed,
}

impl From<CartError> for StoreError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::OutOfStock {
                product_id,
                requested,
                available,
            } => Self::OutOfStock {
                product_id,
                requested,
                available,
            },
            other => Self::Cart(other),
        }
    }
}

impl From<WizardError> for StoreError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(validation) => Self::Validation(validation),
            WizardError::SubmissionInFlight => Self::Submission(SubmissionError::InProgress),
            other => Self::Navigation(other),
        }
    }
}

impl StoreError {
    /// Message suitable for display. Transport details are left out.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err
                .fields
                .first()
                .map_or_else(|| err.to_string(), |field| field.message.to_string()),
            Self::OutOfStock { available: 0, .. } => "This item is out of stock".to_string(),
            Self::OutOfStock { available, .. } => {
                format!("Only {available} left in stock")
            }
            Self::Sync(err) => match err.reason {
                FailureReason::RateLimited { .. } => {
                    "Too many requests, please wait a moment and try again".to_string()
                }
                _ => format!("Couldn't {}. Please try again", err.operation),
            },
            Self::Submission(SubmissionError::InProgress) => {
                "Your order is already being placed".to_string()
            }
            Self::Submission(SubmissionError::Failed(_)) => {
                "We couldn't place your order. Your cart has been kept, please try again"
                    .to_string()
            }
            Self::Navigation(_) => "That step isn't available right now".to_string(),
            Self::Cart(_) => "That cart item is no longer available".to_string(),
            Self::Favorite(_) | Self::LinePending(_) => {
                "Please wait for the previous change to finish".to_string()
            }
            Self::SessionClosed => "Your session has ended".to_string(),
        }
    }

    /// Whether the user may retry the same action unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Sync(err) => err.reason.is_retryable(),
            Self::Submission(SubmissionError::Failed(reason)) => reason.is_retryable(),
            Self::Favorite(_) | Self::LinePending(_) | Self::Submission(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
