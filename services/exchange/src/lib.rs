//! Exchange Supervisor Service
//!
//! The process-wide face of the betting exchange: a supervisor owning the
//! monetary ledger, the per-market tasks and the bet counter, plus the
//! node wrapper handling `start`/`stop`/`clean` against the snapshot
//! store. Every market runs single-writer on its own task; the supervisor
//! serialises all ledger movement.

pub mod config;
pub mod ledger;
pub mod market_task;
pub mod node;
pub mod supervisor;

pub use config::ExchangeConfig;
pub use ledger::{Ledger, UserAccount};
pub use node::ExchangeNode;
pub use supervisor::Exchange;
