//! Matching Engine Service
//!
//! Per-market order book and matching logic for a back/lay betting
//! exchange. Each market holds a pair of odds-ordered queues and the full
//! record of its bets; matching crosses the queue heads at the resting
//! back's quoted odds and settlement distributes matched stakes once the
//! outcome is known.
//!
//! **Key invariants:**
//! - Odds-time priority strictly enforced on both sides of the book
//! - Only active bets with unmatched stake appear in the book
//! - Money conservation: stakes move between the unmatched remainder and
//!   matched portions, never appear or vanish

pub mod book;
pub mod market;
pub mod matching;
pub mod settlement;

pub use market::MarketEngine;
