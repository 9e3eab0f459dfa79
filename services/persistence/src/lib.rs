//! Persistence Service
//!
//! Snapshots the whole exchange state into a durable key-value store keyed
//! by exchange name, and restores it on restart. One snapshot file per
//! exchange; writes are atomic, reads verify a checksum before anything is
//! trusted.

pub mod snapshot;
pub mod store;

pub use snapshot::{ExchangeSnapshot, MarketSnapshot, UserSnapshot};
pub use store::{SnapshotError, SnapshotStore};
