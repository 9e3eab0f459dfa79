//! Market lifecycle types

use crate::ids::MarketId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market status
///
/// Transitions are one-way: `Active -> {Frozen, Cancelled, Settled}` and
/// `Frozen -> {Cancelled, Settled}`. `Cancelled` and `Settled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Open for placement and matching
    Active,
    /// Closed to new bets; unmatched stakes returned, matched portions held
    Frozen,
    /// Abandoned; every stake returned (terminal)
    Cancelled,
    /// Resolved with the given outcome (terminal)
    Settled(bool),
}

impl MarketStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MarketStatus::Cancelled | MarketStatus::Settled(_))
    }

    /// Whether new bets may be placed
    pub fn allows_placement(&self) -> bool {
        matches!(self, MarketStatus::Active)
    }

    /// Whether a transition to `next` is allowed from this status
    pub fn can_transition(&self, next: MarketStatus) -> bool {
        match self {
            MarketStatus::Active => matches!(
                next,
                MarketStatus::Frozen | MarketStatus::Cancelled | MarketStatus::Settled(_)
            ),
            MarketStatus::Frozen => {
                matches!(next, MarketStatus::Cancelled | MarketStatus::Settled(_))
            }
            MarketStatus::Cancelled | MarketStatus::Settled(_) => false,
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Active => write!(f, "active"),
            MarketStatus::Frozen => write!(f, "frozen"),
            MarketStatus::Cancelled => write!(f, "cancelled"),
            MarketStatus::Settled(outcome) => write!(f, "settled({})", outcome),
        }
    }
}

/// Descriptive market record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub id: MarketId,
    pub description: String,
    pub status: MarketStatus,
}

impl MarketInfo {
    /// Create a new active market
    pub fn new(id: MarketId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            status: MarketStatus::Active,
        }
    }
}
