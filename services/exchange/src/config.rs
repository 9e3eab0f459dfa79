//! Exchange configuration
//!
//! Nothing beyond a persistence directory and whether snapshots are
//! compressed; the exchange name is passed to `start`.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Directory the snapshot store writes into.
    pub data_dir: PathBuf,
    /// Compress snapshots with zstd.
    pub compress_snapshots: bool,
}

impl ExchangeConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            compress_snapshots: true,
        }
    }

    pub fn uncompressed(mut self) -> Self {
        self.compress_snapshots = false;
        self
    }
}
