//! Storage backends for raffle numbers and registrations.

mod file;
mod memory;

pub use file::{FileNumberStore, FileRegistrationLog};
pub use memory::{MemoryNumberStore, MemoryRegistrationLog};

use crate::error::LedgerError;
use crate::types::{NewRegistration, NumberStatus, RaffleNumber, Registration};
use async_trait::async_trait;

/// Row-oriented table of raffle numbers.
///
/// Implementations must apply `compare_and_set` atomically with respect to
/// every other call on the same store.
#[async_trait]
pub trait NumberStore: Send + Sync {
    /// Current status of every number, ascending.
    async fn snapshot(&self) -> Result<Vec<RaffleNumber>, LedgerError>;

    /// Set `number` to `new` only if it currently has status `expected`.
    ///
    /// Returns `false` without writing when the current status differs.
    async fn compare_and_set(
        &self,
        number: u16,
        expected: NumberStatus,
        new: NumberStatus,
    ) -> Result<bool, LedgerError>;
}

/// Append-only log of completed purchases.
#[async_trait]
pub trait RegistrationLog: Send + Sync {
    /// Record a purchase, assigning the next sequential id.
    async fn append(&self, entry: NewRegistration) -> Result<Registration, LedgerError>;

    /// All registrations in insertion order.
    async fn list(&self) -> Result<Vec<Registration>, LedgerError>;

    /// Number of registrations recorded so far.
    async fn count(&self) -> Result<usize, LedgerError> {
        Ok(self.list().await?.len())
    }
}
