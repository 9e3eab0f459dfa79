//! Unique identifier types for exchange entities
//!
//! Users and markets are identified by opaque strings chosen by the caller;
//! bets are identified by a per-exchange monotonic counter qualified with the
//! owning user and market, so a bet id is resolvable without any extra lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a user account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Market identifier
///
/// Markets are registered under a caller-chosen name, unique within
/// an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Create a new MarketId from a string
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MarketId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Unique identifier for a bet
///
/// The counter is allocated by the exchange supervisor and is strictly
/// monotonic across all markets, so bet ids double as placement-order
/// sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BetId {
    pub user: UserId,
    pub market: MarketId,
    pub counter: u64,
}

impl BetId {
    pub fn new(user: UserId, market: MarketId, counter: u64) -> Self {
        Self {
            user,
            market,
            counter,
        }
    }
}

// Ordered by counter first: listings sorted on BetId come out in
// placement order regardless of owner or market.
impl Ord for BetId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.counter
            .cmp(&other.counter)
            .then_with(|| self.user.cmp(&other.user))
            .then_with(|| self.market.cmp(&other.market))
    }
}

impl PartialOrd for BetId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.user, self.market, self.counter)
    }
}
