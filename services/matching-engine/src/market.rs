//! Market engine
//!
//! Owns everything for a single market: the descriptive record, the two
//! book queues and the full bet store. All mutating operations go through
//! `&mut self`, so a market engine driven from one task is single-writer
//! by construction.

use std::collections::HashMap;
use tracing::{debug, info};
use types::bet::{Bet, BetSide, BetStatus};
use types::errors::{ExchangeError, NotFoundKind};
use types::ids::{BetId, MarketId};
use types::market::{MarketInfo, MarketStatus};
use types::numeric::{Amount, Odds};

use crate::book::{BackQueue, LayQueue};
use crate::matching;
use crate::settlement;

/// Order book, bet store and lifecycle state for one market
#[derive(Debug)]
pub struct MarketEngine {
    info: MarketInfo,
    backs: BackQueue,
    lays: LayQueue,
    bets: HashMap<BetId, Bet>,
}

impl MarketEngine {
    /// Create a new active market
    pub fn new(id: MarketId, description: impl Into<String>) -> Self {
        Self {
            info: MarketInfo::new(id, description),
            backs: BackQueue::new(),
            lays: LayQueue::new(),
            bets: HashMap::new(),
        }
    }

    /// Rebuild a market from restored state
    ///
    /// Bets are expected in placement (counter) order per side; replaying
    /// the insertions in that order reproduces the original book order,
    /// since insertion is stable on equal odds.
    pub fn restore(info: MarketInfo, backs: Vec<Bet>, lays: Vec<Bet>) -> Self {
        let mut engine = Self {
            info,
            backs: BackQueue::new(),
            lays: LayQueue::new(),
            bets: HashMap::new(),
        };
        for bet in backs {
            if bet.is_bookable() {
                engine.backs.insert(bet.odds, bet.id.clone());
            }
            engine.bets.insert(bet.id.clone(), bet);
        }
        for bet in lays {
            if bet.is_bookable() {
                engine.lays.insert(bet.odds, bet.id.clone());
            }
            engine.bets.insert(bet.id.clone(), bet);
        }
        engine
    }

    /// Dump the market state for a snapshot: `(info, backs, lays)` with
    /// each side's bets in placement order
    pub fn export(&self) -> (MarketInfo, Vec<Bet>, Vec<Bet>) {
        let mut backs: Vec<Bet> = self
            .bets
            .values()
            .filter(|b| b.side == BetSide::Back)
            .cloned()
            .collect();
        let mut lays: Vec<Bet> = self
            .bets
            .values()
            .filter(|b| b.side == BetSide::Lay)
            .cloned()
            .collect();
        backs.sort_by(|a, b| a.id.cmp(&b.id));
        lays.sort_by(|a, b| a.id.cmp(&b.id));
        (self.info.clone(), backs, lays)
    }

    pub fn info(&self) -> MarketInfo {
        self.info.clone()
    }

    pub fn status(&self) -> MarketStatus {
        self.info.status
    }

    /// Record a new bet and insert it into the book
    ///
    /// The caller has already withdrawn `stake` from the owner's balance
    /// and allocated the id.
    pub fn place(
        &mut self,
        id: BetId,
        side: BetSide,
        stake: Amount,
        odds: Odds,
    ) -> Result<BetId, ExchangeError> {
        if !self.info.status.allows_placement() {
            return Err(ExchangeError::invalid_state(
                &self.info.id,
                self.info.status,
            ));
        }
        if stake.is_zero() {
            return Err(ExchangeError::invalid_amount("stake must be positive"));
        }
        if self.bets.contains_key(&id) {
            return Err(ExchangeError::duplicate(&id));
        }

        match side {
            BetSide::Back => self.backs.insert(odds, id.clone()),
            BetSide::Lay => self.lays.insert(odds, id.clone()),
        }
        self.bets
            .insert(id.clone(), Bet::new(id.clone(), side, odds, stake));

        debug!(bet = %id, ?side, %stake, %odds, "bet placed");
        Ok(id)
    }

    /// Cancel the unmatched remainder of a bet, returning it for refund
    ///
    /// A bet with no fills is cancelled outright; a partially matched bet
    /// stays live for its matched portion. Calling this on a bet that has
    /// nothing left to cancel refunds zero, so double delivery is harmless.
    pub fn cancel_unmatched(&mut self, id: &BetId) -> Result<Amount, ExchangeError> {
        if self.info.status.is_terminal() {
            return Err(ExchangeError::invalid_state(
                &self.info.id,
                self.info.status,
            ));
        }
        let bet = self
            .bets
            .get_mut(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::Bet, id))?;
        if bet.status.is_terminal() {
            return Ok(Amount::ZERO);
        }

        let refund = bet.remaining_stake;
        bet.remaining_stake = Amount::ZERO;
        if bet.is_unmatched() {
            bet.status = BetStatus::Cancelled;
        }
        let side = bet.side;
        match side {
            BetSide::Back => self.backs.remove(id),
            BetSide::Lay => self.lays.remove(id),
        };

        debug!(bet = %id, %refund, "unmatched stake cancelled");
        Ok(refund)
    }

    /// Cancel a bet in whole, returning everything it still holds
    ///
    /// Only used while unwinding a cancelled market: matched portions are
    /// torn up and returned along with the unmatched remainder. Refunds
    /// zero for bets that already reached a terminal state.
    pub fn cancel_whole(&mut self, id: &BetId) -> Result<Amount, ExchangeError> {
        let bet = self
            .bets
            .get_mut(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::Bet, id))?;
        if bet.status.is_terminal() {
            return Ok(Amount::ZERO);
        }

        let refund = settlement::whole_refund(bet);
        bet.status = BetStatus::MarketCancelled;
        bet.remaining_stake = Amount::ZERO;
        bet.matched.clear();
        let side = bet.side;
        match side {
            BetSide::Back => self.backs.remove(id),
            BetSide::Lay => self.lays.remove(id),
        };

        debug!(bet = %id, %refund, "bet refunded in whole");
        Ok(refund)
    }

    /// Freeze the market and hand back every bet id so the caller can
    /// refund unmatched remainders
    ///
    /// The status flips before the list is returned: by the time anyone
    /// sees the ids, placement is already shut off.
    pub fn freeze(&mut self) -> Result<Vec<BetId>, ExchangeError> {
        self.transition(MarketStatus::Frozen)?;
        info!(market = %self.info.id, "market frozen");
        Ok(self.bet_ids())
    }

    /// Cancel the market and hand back every bet id for whole refunds
    pub fn cancel(&mut self) -> Result<Vec<BetId>, ExchangeError> {
        self.transition(MarketStatus::Cancelled)?;
        info!(market = %self.info.id, "market cancelled");
        Ok(self.bet_ids())
    }

    /// Settle the market, returning the amount to credit per bet
    ///
    /// Every live bet is marked settled with its stake zeroed; the payout
    /// amounts follow the back/lay settlement arithmetic.
    pub fn settle(&mut self, outcome: bool) -> Result<Vec<(BetId, Amount)>, ExchangeError> {
        self.transition(MarketStatus::Settled(outcome))?;

        let mut payouts = Vec::with_capacity(self.bets.len());
        let ids = self.bet_ids();
        for id in ids {
            let bet = self.bets.get_mut(&id).expect("bet listed but not stored");
            if bet.status != BetStatus::Active {
                continue;
            }
            let amount = settlement::payout(bet, outcome);
            bet.status = BetStatus::MarketSettled(outcome);
            bet.remaining_stake = Amount::ZERO;
            payouts.push((id, amount));
        }
        self.backs.clear();
        self.lays.clear();

        info!(market = %self.info.id, outcome, payouts = payouts.len(), "market settled");
        Ok(payouts)
    }

    /// Run the matching loop; returns the number of fills
    pub fn run_matching(&mut self) -> Result<usize, ExchangeError> {
        if self.info.status.is_terminal() {
            return Err(ExchangeError::invalid_state(
                &self.info.id,
                self.info.status,
            ));
        }
        Ok(matching::cross(
            &mut self.backs,
            &mut self.lays,
            &mut self.bets,
        ))
    }

    pub fn bet(&self, id: &BetId) -> Option<&Bet> {
        self.bets.get(id)
    }

    /// All bet ids ever recorded for this market, in placement order
    pub fn bet_ids(&self) -> Vec<BetId> {
        let mut ids: Vec<BetId> = self.bets.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Resting back bets as `(odds, bet_id)` in book order
    pub fn pending_backs(&self) -> Vec<(Odds, BetId)> {
        self.backs
            .iter()
            .filter(|entry| self.entry_is_live(&entry.bet))
            .map(|entry| (entry.odds, entry.bet.clone()))
            .collect()
    }

    /// Resting lay bets as `(odds, bet_id)` in book order
    pub fn pending_lays(&self) -> Vec<(Odds, BetId)> {
        self.lays
            .iter()
            .filter(|entry| self.entry_is_live(&entry.bet))
            .map(|entry| (entry.odds, entry.bet.clone()))
            .collect()
    }

    // A queue entry may outlive its usefulness between matching passes;
    // listings go by the bet record, not by queue membership.
    fn entry_is_live(&self, id: &BetId) -> bool {
        self.bets.get(id).map(Bet::is_bookable).unwrap_or(false)
    }

    fn transition(&mut self, next: MarketStatus) -> Result<(), ExchangeError> {
        if !self.info.status.can_transition(next) {
            return Err(ExchangeError::invalid_state(
                &self.info.id,
                self.info.status,
            ));
        }
        self.info.status = next;
        Ok(())
    }
}
