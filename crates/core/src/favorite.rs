//! Optimistic favorite toggle.
//!
//! ```text
//! Unknown --resolve--> Favorited <--toggle--> NotFavorited
//! ```
//!
//! A toggle flips the state immediately and hands back a [`PendingToggle`].
//! Settling the ticket either keeps the flip or reverts it. Only one toggle
//! may be in flight at a time; a second [`FavoriteToggle::begin`] is refused
//! with [`FavoriteError::InFlight`] rather than queued.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Favorite status of one product for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteState {
    /// Not yet checked against the remote store.
    #[default]
    Unknown,
    Favorited,
    NotFavorited,
}

impl FavoriteState {
    #[must_use]
    pub const fn from_bool(favorited: bool) -> Self {
        if favorited {
            Self::Favorited
        } else {
            Self::NotFavorited
        }
    }

    /// `None` while unknown.
    #[must_use]
    pub const fn is_favorited(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Favorited => Some(true),
            Self::NotFavorited => Some(false),
        }
    }
}

/// Errors starting a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FavoriteError {
    /// The state must be resolved before it can be flipped.
    #[error("favorite state not yet known")]
    Unresolved,

    /// Another toggle for this product hasn't settled.
    #[error("favorite toggle already in flight")]
    InFlight,
}

/// Ticket for an optimistic flip awaiting remote confirmation.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending toggle must be settled"]
pub struct PendingToggle {
    previous: FavoriteState,
    target: FavoriteState,
}

impl PendingToggle {
    /// Whether the remote call should add (true) or remove (false) the favorite.
    #[must_use]
    pub fn adds(&self) -> bool {
        self.target == FavoriteState::Favorited
    }

    #[must_use]
    pub const fn previous(&self) -> FavoriteState {
        self.previous
    }

    #[must_use]
    pub const fn target(&self) -> FavoriteState {
        self.target
    }
}

/// Toggle state for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteToggle {
    state: FavoriteState,
    in_flight: bool,
}

impl FavoriteToggle {
    /// Start in the unknown state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known remote value.
    #[must_use]
    pub const fn resolved(favorited: bool) -> Self {
        Self {
            state: FavoriteState::from_bool(favorited),
            in_flight: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> FavoriteState {
        self.state
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Record the remote value. Ignored while a toggle is in flight, since the
    /// toggle's own outcome will settle the state.
    ///
    /// Returns whether the value was applied.
    pub const fn resolve(&mut self, favorited: bool) -> bool {
        if self.in_flight {
            return false;
        }
        self.state = FavoriteState::from_bool(favorited);
        true
    }

    /// Flip optimistically.
    ///
    /// # Errors
    ///
    /// - [`FavoriteError::Unresolved`] while the state is unknown.
    /// - [`FavoriteError::InFlight`] if a previous toggle hasn't settled.
    pub const fn begin(&mut self) -> Result<PendingToggle, FavoriteError> {
        if self.in_flight {
            return Err(FavoriteError::InFlight);
        }
        let target = match self.state {
            FavoriteState::Unknown => return Err(FavoriteError::Unresolved),
            FavoriteState::Favorited => FavoriteState::NotFavorited,
            FavoriteState::NotFavorited => FavoriteState::Favorited,
        };
        let previous = self.state;
        self.state = target;
        self.in_flight = true;
        Ok(PendingToggle { previous, target })
    }

    /// Keep the flip if the remote call succeeded, otherwise revert it.
    pub fn settle(&mut self, ticket: PendingToggle, succeeded: bool) -> FavoriteState {
        self.in_flight = false;
        self.state = if succeeded {
            ticket.target
        } else {
            ticket.previous
        };
        self.state
    }
}
