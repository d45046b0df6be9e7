//! Raffle number ledger.
//!
//! Tracks the status of every raffle number, enforces at-most-once
//! reservation, and keeps the append-only log of completed registrations.
//!
//! # Modules
//!
//! - [`contact`] - Contact phone validation
//! - [`selection`] - Parsing of comma-separated number selections
//! - [`ledger`] - Serialized availability check and reservation
//! - [`store`] - Storage backends (in-memory and JSON files)

pub mod contact;
mod error;
pub mod ledger;
pub mod selection;
pub mod store;
mod types;

pub use contact::{contact_digits, is_valid_contact};
pub use error::LedgerError;
pub use ledger::NumberLedger;
pub use selection::{parse_selection, SelectionError};
pub use store::{
    FileNumberStore, FileRegistrationLog, MemoryNumberStore, MemoryRegistrationLog, NumberStore,
    RegistrationLog,
};
pub use types::*;
