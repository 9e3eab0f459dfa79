//! Bet lifecycle types

use crate::ids::{BetId, MarketId, UserId};
use crate::numeric::{Amount, Odds};
use serde::{Deserialize, Serialize};

/// Which side of a market a bet takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetSide {
    /// Bet that the outcome occurs
    Back,
    /// Bet against the outcome; the stake is committed liability
    Lay,
}

impl BetSide {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            BetSide::Back => BetSide::Lay,
            BetSide::Lay => BetSide::Back,
        }
    }
}

/// Bet status
///
/// `Active` covers the whole pre-resolution life of a bet, matched or not.
/// The market-level outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetStatus {
    /// Live: may rest in the book, match, or be cancelled
    Active,
    /// Cancelled in whole; stake returned (terminal)
    Cancelled,
    /// The owning market was cancelled; stake returned (terminal)
    MarketCancelled,
    /// The owning market settled with the given outcome (terminal)
    MarketSettled(bool),
}

impl BetStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Active)
    }
}

/// One matched portion of a bet
///
/// Appended to both sides of a match, each holding the other as
/// counterparty. `back_stake` is what the backer committed to this portion
/// and `lay_liability` what the layer committed; both are fixed at match
/// time so settlement never needs to consult the counterparty record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFill {
    pub counterparty: BetId,
    pub back_stake: Amount,
    pub lay_liability: Amount,
    /// Odds the portion crossed at (the back's quoted odds)
    pub odds: Odds,
}

/// A single back or lay bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub side: BetSide,
    pub odds: Odds,
    pub original_stake: Amount,
    pub remaining_stake: Amount,
    pub matched: Vec<MatchFill>,
    pub status: BetStatus,
}

impl Bet {
    /// Create a new active bet with its full stake unmatched
    pub fn new(id: BetId, side: BetSide, odds: Odds, stake: Amount) -> Self {
        Self {
            id,
            side,
            odds,
            original_stake: stake,
            remaining_stake: stake,
            matched: Vec::new(),
            status: BetStatus::Active,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.id.user
    }

    pub fn market(&self) -> &MarketId {
        &self.id.market
    }

    /// Stake this bet has committed to matched portions
    ///
    /// For a back that is the backer stake consumed by fills; for a lay it
    /// is the liability consumed. Together with `remaining_stake` this is
    /// everything the bet still holds in custody.
    pub fn matched_stake(&self) -> Amount {
        match self.side {
            BetSide::Back => self.matched.iter().map(|f| f.back_stake).sum(),
            BetSide::Lay => self.matched.iter().map(|f| f.lay_liability).sum(),
        }
    }

    pub fn is_unmatched(&self) -> bool {
        self.matched.is_empty()
    }

    /// Whether the bet belongs in the order book
    pub fn is_bookable(&self) -> bool {
        self.status == BetStatus::Active && !self.remaining_stake.is_zero()
    }

    /// Stake bound check: the unmatched remainder can never exceed what was
    /// originally placed
    pub fn check_invariant(&self) -> bool {
        self.remaining_stake <= self.original_stake
    }

    /// Record a matched portion and reduce the unmatched remainder by this
    /// side's committed stake
    pub fn apply_fill(&mut self, fill: MatchFill) {
        let consumed = match self.side {
            BetSide::Back => fill.back_stake,
            BetSide::Lay => fill.lay_liability,
        };
        self.remaining_stake -= consumed;
        self.matched.push(fill);
    }
}
