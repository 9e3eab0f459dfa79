//! Error taxonomy for the exchange
//!
//! Every fallible public operation returns one of these kinds; errors are
//! values at the API boundary, never panics. Panics are reserved for
//! internal invariant violations (a market task that has corrupted its own
//! bookkeeping must die, not keep moving money).

use thiserror::Error;

/// What kind of entity a failed lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    User,
    Market,
    Bet,
}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundKind::User => write!(f, "user"),
            NotFoundKind::Market => write!(f, "market"),
            NotFoundKind::Bet => write!(f, "bet"),
        }
    }
}

/// Top-level exchange error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("duplicate id: {id}")]
    DuplicateId { id: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: NotFoundKind, id: String },

    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("market {market} is {status}, operation not allowed")]
    InvalidState { market: String, status: String },

    #[error("exchange already running: {name}")]
    AlreadyRunning { name: String },

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("market task is gone")]
    ChannelClosed,
}

impl ExchangeError {
    pub fn duplicate(id: impl std::fmt::Display) -> Self {
        ExchangeError::DuplicateId { id: id.to_string() }
    }

    pub fn not_found(kind: NotFoundKind, id: impl std::fmt::Display) -> Self {
        ExchangeError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        ExchangeError::InvalidAmount {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(market: impl std::fmt::Display, status: impl std::fmt::Display) -> Self {
        ExchangeError::InvalidState {
            market: market.to_string(),
            status: status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ExchangeError::not_found(NotFoundKind::Market, "derby");
        assert_eq!(err.to_string(), "market not found: derby");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ExchangeError::invalid_state("derby", "settled(true)");
        assert!(err.to_string().contains("derby"));
        assert!(err.to_string().contains("settled(true)"));
    }

    #[test]
    fn test_invalid_amount_display() {
        let err = ExchangeError::invalid_amount("withdrawal exceeds balance");
        assert_eq!(
            err.to_string(),
            "invalid amount: withdrawal exceeds balance"
        );
    }
}
