//! Per-market task
//!
//! Each market engine runs on its own task, draining a command mailbox one
//! message at a time; replies travel back over oneshot channels. That
//! makes every market single-writer while letting different markets run in
//! parallel. Status transitions happen inside the task before their reply
//! is sent, so by the time the supervisor starts a refund loop no
//! concurrent placement can slip in ahead of it.

use matching_engine::MarketEngine;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::trace;
use types::bet::{Bet, BetSide};
use types::errors::ExchangeError;
use types::ids::BetId;
use types::market::MarketInfo;
use types::numeric::{Amount, Odds};

const MAILBOX_DEPTH: usize = 64;

/// Commands a market task understands
pub enum MarketCommand {
    Place {
        id: BetId,
        side: BetSide,
        stake: Amount,
        odds: Odds,
        reply: oneshot::Sender<Result<BetId, ExchangeError>>,
    },
    CancelUnmatched {
        id: BetId,
        reply: oneshot::Sender<Result<Amount, ExchangeError>>,
    },
    CancelWhole {
        id: BetId,
        reply: oneshot::Sender<Result<Amount, ExchangeError>>,
    },
    Freeze {
        reply: oneshot::Sender<Result<Vec<BetId>, ExchangeError>>,
    },
    Cancel {
        reply: oneshot::Sender<Result<Vec<BetId>, ExchangeError>>,
    },
    Settle {
        outcome: bool,
        reply: oneshot::Sender<Result<Vec<(BetId, Amount)>, ExchangeError>>,
    },
    RunMatching {
        reply: oneshot::Sender<Result<usize, ExchangeError>>,
    },
    Info {
        reply: oneshot::Sender<MarketInfo>,
    },
    Bet {
        id: BetId,
        reply: oneshot::Sender<Option<Bet>>,
    },
    BetIds {
        reply: oneshot::Sender<Vec<BetId>>,
    },
    PendingBacks {
        reply: oneshot::Sender<Vec<(Odds, BetId)>>,
    },
    PendingLays {
        reply: oneshot::Sender<Vec<(Odds, BetId)>>,
    },
    Export {
        reply: oneshot::Sender<(MarketInfo, Vec<Bet>, Vec<Bet>)>,
    },
}

/// Handle to a spawned market task
#[derive(Debug)]
pub struct MarketHandle {
    tx: mpsc::Sender<MarketCommand>,
    join: JoinHandle<()>,
}

impl MarketHandle {
    /// Move a market engine onto its own task and return the handle
    pub fn spawn(engine: MarketEngine) -> Self {
        let (tx, mut rx) = mpsc::channel(MAILBOX_DEPTH);
        let join = tokio::spawn(async move {
            let mut engine = engine;
            while let Some(command) = rx.recv().await {
                dispatch(&mut engine, command);
            }
            trace!("market task drained");
        });
        Self { tx, join }
    }

    pub async fn place(
        &self,
        id: BetId,
        side: BetSide,
        stake: Amount,
        odds: Odds,
    ) -> Result<BetId, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Place {
            id,
            side,
            stake,
            odds,
            reply,
        })
        .await?;
        recv(rx).await?
    }

    pub async fn cancel_unmatched(&self, id: BetId) -> Result<Amount, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::CancelUnmatched { id, reply }).await?;
        recv(rx).await?
    }

    pub async fn cancel_whole(&self, id: BetId) -> Result<Amount, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::CancelWhole { id, reply }).await?;
        recv(rx).await?
    }

    pub async fn freeze(&self) -> Result<Vec<BetId>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Freeze { reply }).await?;
        recv(rx).await?
    }

    pub async fn cancel(&self) -> Result<Vec<BetId>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Cancel { reply }).await?;
        recv(rx).await?
    }

    pub async fn settle(&self, outcome: bool) -> Result<Vec<(BetId, Amount)>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Settle { outcome, reply }).await?;
        recv(rx).await?
    }

    pub async fn run_matching(&self) -> Result<usize, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::RunMatching { reply }).await?;
        recv(rx).await?
    }

    pub async fn info(&self) -> Result<MarketInfo, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Info { reply }).await?;
        recv(rx).await
    }

    pub async fn bet(&self, id: BetId) -> Result<Option<Bet>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Bet { id, reply }).await?;
        recv(rx).await
    }

    pub async fn bet_ids(&self) -> Result<Vec<BetId>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::BetIds { reply }).await?;
        recv(rx).await
    }

    pub async fn pending_backs(&self) -> Result<Vec<(Odds, BetId)>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::PendingBacks { reply }).await?;
        recv(rx).await
    }

    pub async fn pending_lays(&self) -> Result<Vec<(Odds, BetId)>, ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::PendingLays { reply }).await?;
        recv(rx).await
    }

    pub async fn export(&self) -> Result<(MarketInfo, Vec<Bet>, Vec<Bet>), ExchangeError> {
        let (reply, rx) = oneshot::channel();
        self.send(MarketCommand::Export { reply }).await?;
        recv(rx).await
    }

    /// Close the mailbox and wait for the task to finish
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.join.await;
    }

    async fn send(&self, command: MarketCommand) -> Result<(), ExchangeError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ExchangeError::ChannelClosed)
    }
}

async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T, ExchangeError> {
    rx.await.map_err(|_| ExchangeError::ChannelClosed)
}

// Replies to callers that gave up are dropped on the floor; the state
// change has already happened either way.
fn dispatch(engine: &mut MarketEngine, command: MarketCommand) {
    match command {
        MarketCommand::Place {
            id,
            side,
            stake,
            odds,
            reply,
        } => {
            let _ = reply.send(engine.place(id, side, stake, odds));
        }
        MarketCommand::CancelUnmatched { id, reply } => {
            let _ = reply.send(engine.cancel_unmatched(&id));
        }
        MarketCommand::CancelWhole { id, reply } => {
            let _ = reply.send(engine.cancel_whole(&id));
        }
        MarketCommand::Freeze { reply } => {
            let _ = reply.send(engine.freeze());
        }
        MarketCommand::Cancel { reply } => {
            let _ = reply.send(engine.cancel());
        }
        MarketCommand::Settle { outcome, reply } => {
            let _ = reply.send(engine.settle(outcome));
        }
        MarketCommand::RunMatching { reply } => {
            let _ = reply.send(engine.run_matching());
        }
        MarketCommand::Info { reply } => {
            let _ = reply.send(engine.info());
        }
        MarketCommand::Bet { id, reply } => {
            let _ = reply.send(engine.bet(&id).cloned());
        }
        MarketCommand::BetIds { reply } => {
            let _ = reply.send(engine.bet_ids());
        }
        MarketCommand::PendingBacks { reply } => {
            let _ = reply.send(engine.pending_backs());
        }
        MarketCommand::PendingLays { reply } => {
            let _ = reply.send(engine.pending_lays());
        }
        MarketCommand::Export { reply } => {
            let _ = reply.send(engine.export());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{MarketId, UserId};

    fn bet_id(counter: u64) -> BetId {
        BetId::new(UserId::new("u1"), MarketId::new("m1"), counter)
    }

    #[tokio::test]
    async fn test_commands_round_trip() {
        let handle = MarketHandle::spawn(MarketEngine::new(MarketId::new("m1"), "test"));

        let placed = handle
            .place(bet_id(1), BetSide::Back, Amount::new(1000), Odds::new(150))
            .await
            .unwrap();
        assert_eq!(placed, bet_id(1));

        let info = handle.info().await.unwrap();
        assert_eq!(info.id, MarketId::new("m1"));

        let pending = handle.pending_backs().await.unwrap();
        assert_eq!(pending.len(), 1);

        let bet = handle.bet(bet_id(1)).await.unwrap().unwrap();
        assert_eq!(bet.remaining_stake, Amount::new(1000));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_operations_on_one_market_are_serialised() {
        let handle = MarketHandle::spawn(MarketEngine::new(MarketId::new("m1"), "test"));

        // Queue a burst of placements without awaiting between sends; the
        // mailbox preserves arrival order so the book order is stable.
        for counter in 1..=10u64 {
            handle
                .place(
                    bet_id(counter),
                    BetSide::Back,
                    Amount::new(100),
                    Odds::new(150),
                )
                .await
                .unwrap();
        }

        let pending = handle.pending_backs().await.unwrap();
        let counters: Vec<u64> = pending.iter().map(|(_, id)| id.counter).collect();
        assert_eq!(counters, (1..=10).collect::<Vec<_>>());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task() {
        let handle = MarketHandle::spawn(MarketEngine::new(MarketId::new("m1"), "test"));
        handle
            .place(bet_id(1), BetSide::Back, Amount::new(100), Odds::new(150))
            .await
            .unwrap();
        // returns only once the task has drained and exited
        handle.shutdown().await;
    }
}
