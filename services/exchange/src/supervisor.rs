//! Exchange supervisor
//!
//! Owns the ledger, the market registry and the exchange-wide bet counter,
//! and routes every public operation. Markets run on their own tasks; the
//! supervisor is the only writer of the ledger, so the money side of every
//! operation is serialised here while markets stay concurrent with one
//! another.

use std::collections::HashMap;
use tracing::{debug, info, warn};
use types::bet::{Bet, BetSide};
use types::errors::{ExchangeError, NotFoundKind};
use types::ids::{BetId, MarketId, UserId};
use types::market::{MarketInfo, MarketStatus};
use types::numeric::{Amount, Odds};

use matching_engine::MarketEngine;
use persistence::{ExchangeSnapshot, MarketSnapshot, SnapshotStore};

use crate::ledger::{Ledger, UserAccount};
use crate::market_task::MarketHandle;

/// A running exchange
#[derive(Debug)]
pub struct Exchange {
    name: String,
    ledger: Ledger,
    markets: HashMap<MarketId, MarketHandle>,
    /// Creation order, used for listings and snapshots.
    market_order: Vec<MarketId>,
    /// Last allocated bet counter.
    counter: u64,
    store: SnapshotStore,
}

impl Exchange {
    /// Start an exchange under `name`
    ///
    /// If the store holds a snapshot for that name the ledger, counter and
    /// every market are restored from it; otherwise the exchange starts
    /// empty.
    pub fn start(name: impl Into<String>, store: SnapshotStore) -> Result<Self, ExchangeError> {
        let name = name.into();
        let snapshot = store
            .load(&name)
            .map_err(|e| ExchangeError::Persistence(e.to_string()))?;

        let exchange = match snapshot {
            Some(snapshot) => {
                let mut markets = HashMap::new();
                let mut market_order = Vec::with_capacity(snapshot.markets.len());
                for market in snapshot.markets {
                    let id = market.info.id.clone();
                    let engine = MarketEngine::restore(market.info, market.backs, market.lays);
                    markets.insert(id.clone(), MarketHandle::spawn(engine));
                    market_order.push(id);
                }
                info!(
                    %name,
                    users = snapshot.users.len(),
                    markets = market_order.len(),
                    counter = snapshot.counter,
                    "exchange restored from snapshot"
                );
                Self {
                    name,
                    ledger: Ledger::restore(snapshot.users),
                    markets,
                    market_order,
                    counter: snapshot.counter,
                    store,
                }
            }
            None => {
                info!(%name, "exchange started empty");
                Self {
                    name,
                    ledger: Ledger::new(),
                    markets: HashMap::new(),
                    market_order: Vec::new(),
                    counter: 0,
                    store,
                }
            }
        };
        Ok(exchange)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Users ───────────────────────────────────────────────────────

    pub fn user_create(
        &mut self,
        id: impl Into<UserId>,
        name: impl Into<String>,
    ) -> Result<(), ExchangeError> {
        self.ledger.create(id.into(), name)
    }

    pub fn user_deposit(&mut self, id: &UserId, amount: u64) -> Result<(), ExchangeError> {
        self.ledger.deposit(id, Amount::new(amount))
    }

    pub fn user_withdraw(&mut self, id: &UserId, amount: u64) -> Result<(), ExchangeError> {
        self.ledger.withdraw(id, Amount::new(amount))
    }

    pub fn user_get(&self, id: &UserId) -> Result<UserAccount, ExchangeError> {
        self.ledger.get(id)
    }

    pub fn user_bets(&self, id: &UserId) -> Result<Vec<BetId>, ExchangeError> {
        self.ledger.bets(id)
    }

    // ── Markets ─────────────────────────────────────────────────────

    /// Create a new active market under `name`
    pub fn market_create(
        &mut self,
        name: impl Into<MarketId>,
        description: impl Into<String>,
    ) -> Result<MarketId, ExchangeError> {
        let id: MarketId = name.into();
        if self.markets.contains_key(&id) {
            return Err(ExchangeError::duplicate(&id));
        }
        let engine = MarketEngine::new(id.clone(), description);
        self.markets.insert(id.clone(), MarketHandle::spawn(engine));
        self.market_order.push(id.clone());
        info!(market = %id, "market created");
        Ok(id)
    }

    /// Every market in creation order
    pub fn market_list(&self) -> Vec<MarketId> {
        self.market_order.clone()
    }

    /// Markets still open for placement, in creation order
    pub async fn market_list_active(&self) -> Result<Vec<MarketId>, ExchangeError> {
        let mut active = Vec::new();
        for id in &self.market_order {
            let info = self.market(id)?.info().await?;
            if info.status == MarketStatus::Active {
                active.push(id.clone());
            }
        }
        Ok(active)
    }

    pub async fn market_get(&self, id: &MarketId) -> Result<MarketInfo, ExchangeError> {
        self.market(id)?.info().await
    }

    /// Run a matching pass; returns the number of fills executed
    pub async fn market_match(&self, id: &MarketId) -> Result<usize, ExchangeError> {
        self.market(id)?.run_matching().await
    }

    /// Freeze a market and refund the unmatched remainder of every bet
    pub async fn market_freeze(&mut self, id: &MarketId) -> Result<(), ExchangeError> {
        let bet_ids = self.market(id)?.freeze().await?;
        for bet_id in bet_ids {
            let refund = self.market(id)?.cancel_unmatched(bet_id.clone()).await?;
            self.ledger.credit(&bet_id.user, refund)?;
        }
        Ok(())
    }

    /// Cancel a market and refund every bet in whole
    pub async fn market_cancel(&mut self, id: &MarketId) -> Result<(), ExchangeError> {
        let bet_ids = self.market(id)?.cancel().await?;
        for bet_id in bet_ids {
            let refund = self.market(id)?.cancel_whole(bet_id.clone()).await?;
            self.ledger.credit(&bet_id.user, refund)?;
        }
        Ok(())
    }

    /// Settle a market and credit every payout
    pub async fn market_settle(&mut self, id: &MarketId, outcome: bool) -> Result<(), ExchangeError> {
        let payouts = self.market(id)?.settle(outcome).await?;
        for (bet_id, amount) in payouts {
            self.ledger.credit(&bet_id.user, amount)?;
        }
        Ok(())
    }

    pub async fn market_pending_backs(
        &self,
        id: &MarketId,
    ) -> Result<Vec<(Odds, BetId)>, ExchangeError> {
        self.market(id)?.pending_backs().await
    }

    pub async fn market_pending_lays(
        &self,
        id: &MarketId,
    ) -> Result<Vec<(Odds, BetId)>, ExchangeError> {
        self.market(id)?.pending_lays().await
    }

    pub async fn market_bets(&self, id: &MarketId) -> Result<Vec<BetId>, ExchangeError> {
        self.market(id)?.bet_ids().await
    }

    // ── Bets ────────────────────────────────────────────────────────

    /// Place a back bet
    pub async fn bet_back(
        &mut self,
        user: &UserId,
        market: &MarketId,
        stake: u64,
        odds: u64,
    ) -> Result<BetId, ExchangeError> {
        self.place_bet(user, market, BetSide::Back, stake, odds).await
    }

    /// Place a lay bet
    pub async fn bet_lay(
        &mut self,
        user: &UserId,
        market: &MarketId,
        stake: u64,
        odds: u64,
    ) -> Result<BetId, ExchangeError> {
        self.place_bet(user, market, BetSide::Lay, stake, odds).await
    }

    /// Cancel the unmatched remainder of a bet and refund it
    pub async fn bet_cancel(&mut self, bet_id: &BetId) -> Result<(), ExchangeError> {
        let refund = self
            .market(&bet_id.market)?
            .cancel_unmatched(bet_id.clone())
            .await?;
        self.ledger.credit(&bet_id.user, refund)?;
        debug!(bet = %bet_id, %refund, "bet cancelled");
        Ok(())
    }

    pub async fn bet_get(&self, bet_id: &BetId) -> Result<Bet, ExchangeError> {
        self.market(&bet_id.market)?
            .bet(bet_id.clone())
            .await?
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::Bet, bet_id))
    }

    async fn place_bet(
        &mut self,
        user: &UserId,
        market: &MarketId,
        side: BetSide,
        stake: u64,
        odds: u64,
    ) -> Result<BetId, ExchangeError> {
        let odds = Odds::try_new(odds)
            .ok_or_else(|| ExchangeError::invalid_amount("odds must exceed 1.00"))?;
        if stake == 0 {
            return Err(ExchangeError::invalid_amount("stake must be positive"));
        }
        if !self.markets.contains_key(market) {
            return Err(ExchangeError::not_found(NotFoundKind::Market, market));
        }
        let stake = Amount::new(stake);

        // The stake leaves the balance before the bet exists; a rejected
        // placement puts it straight back.
        self.ledger.withdraw(user, stake)?;

        self.counter += 1;
        let bet_id = BetId::new(user.clone(), market.clone(), self.counter);

        let placed = {
            let handle = self.market(market)?;
            handle.place(bet_id.clone(), side, stake, odds).await
        };
        match placed {
            Ok(id) => {
                self.ledger.append_bet(user, id.clone())?;
                debug!(bet = %id, ?side, %stake, %odds, "bet accepted");
                Ok(id)
            }
            Err(err) => {
                warn!(bet = %bet_id, %err, "placement rejected, stake returned");
                self.ledger.credit(user, stake)?;
                Err(err)
            }
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Capture the full exchange state
    pub async fn snapshot(&self) -> Result<ExchangeSnapshot, ExchangeError> {
        let mut markets = Vec::with_capacity(self.market_order.len());
        for id in &self.market_order {
            let (info, backs, lays) = self.market(id)?.export().await?;
            markets.push(MarketSnapshot { info, backs, lays });
        }
        Ok(ExchangeSnapshot {
            users: self.ledger.export(),
            counter: self.counter,
            markets,
        })
    }

    /// Snapshot the exchange and shut every market task down
    pub async fn stop(mut self) -> Result<(), ExchangeError> {
        let snapshot = self.snapshot().await?;
        self.store
            .save(&self.name, &snapshot)
            .map_err(|e| ExchangeError::Persistence(e.to_string()))?;
        info!(name = %self.name, "exchange stopped");
        self.shutdown_markets().await;
        Ok(())
    }

    /// Shut every market task down without saving anything
    pub async fn discard(mut self) {
        info!(name = %self.name, "exchange state discarded");
        self.shutdown_markets().await;
    }

    async fn shutdown_markets(&mut self) {
        for (_, handle) in self.markets.drain() {
            handle.shutdown().await;
        }
    }

    fn market(&self, id: &MarketId) -> Result<&MarketHandle, ExchangeError> {
        self.markets
            .get(id)
            .ok_or_else(|| ExchangeError::not_found(NotFoundKind::Market, id))
    }
}
