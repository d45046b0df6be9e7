//! Ledger errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown raffle number: {0}")]
    UnknownNumber(u16),

    #[error("{0} is already in use by another store")]
    Locked(PathBuf),

    #[error("Unsupported store version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
