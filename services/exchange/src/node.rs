//! Exchange node
//!
//! Process-level entry point holding at most one running exchange. This is
//! where `start`, `stop` and `clean` live: a second `start` without an
//! intervening `stop` or `clean` is refused rather than silently replacing
//! live state.

use persistence::SnapshotStore;
use types::errors::ExchangeError;

use crate::config::ExchangeConfig;
use crate::supervisor::Exchange;

/// Owner of the current exchange, if one is running
pub struct ExchangeNode {
    store: SnapshotStore,
    current: Option<Exchange>,
}

impl ExchangeNode {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            store: SnapshotStore::new(config.data_dir, config.compress_snapshots),
            current: None,
        }
    }

    /// Start an exchange under `name`, restoring its snapshot if present
    pub fn start(&mut self, name: &str) -> Result<&mut Exchange, ExchangeError> {
        if let Some(running) = &self.current {
            return Err(ExchangeError::AlreadyRunning {
                name: running.name().to_string(),
            });
        }
        let exchange = Exchange::start(name, self.store.clone())?;
        Ok(self.current.insert(exchange))
    }

    /// Snapshot and shut down the running exchange, if any
    pub async fn stop(&mut self) -> Result<(), ExchangeError> {
        match self.current.take() {
            Some(exchange) => exchange.stop().await,
            None => Ok(()),
        }
    }

    /// Discard the named exchange: in-memory state (when it is the one
    /// running) and its snapshot
    pub async fn clean(&mut self, name: &str) -> Result<(), ExchangeError> {
        if self
            .current
            .as_ref()
            .map(|exchange| exchange.name() == name)
            .unwrap_or(false)
        {
            if let Some(exchange) = self.current.take() {
                exchange.discard().await;
            }
        }
        self.store
            .delete(name)
            .map_err(|e| ExchangeError::Persistence(e.to_string()))
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn exchange(&self) -> Option<&Exchange> {
        self.current.as_ref()
    }

    pub fn exchange_mut(&mut self) -> Option<&mut Exchange> {
        self.current.as_mut()
    }
}
