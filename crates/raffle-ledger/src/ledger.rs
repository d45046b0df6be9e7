//! Number ledger: availability reads and serialized reservation.

use crate::error::LedgerError;
use crate::store::{MemoryNumberStore, NumberStore};
use crate::types::{AvailabilitySummary, NumberStatus};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Allocates raffle numbers on top of a [`NumberStore`].
///
/// `reserve` and `release` run one at a time per ledger, and every write
/// goes through the store's conditional update, so a number is never handed
/// to two registrations even when several ledgers share one store.
pub struct NumberLedger {
    store: Arc<dyn NumberStore>,
    writer: Mutex<()>,
}

impl NumberLedger {
    pub fn new(store: Arc<dyn NumberStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Ledger over a fresh in-memory table.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryNumberStore::new()))
    }

    /// Available numbers, ascending.
    pub async fn list_available(&self) -> Result<Vec<u16>, LedgerError> {
        Ok(self
            .store
            .snapshot()
            .await?
            .into_iter()
            .filter(|n| n.is_available())
            .map(|n| n.number)
            .collect())
    }

    /// The requested numbers that cannot be picked right now.
    ///
    /// Numbers missing from the table count as unavailable.
    pub async fn unavailable_among(
        &self,
        requested: &BTreeSet<u16>,
    ) -> Result<Vec<u16>, LedgerError> {
        let available: BTreeSet<u16> = self.list_available().await?.into_iter().collect();
        Ok(requested.difference(&available).copied().collect())
    }

    pub async fn summary(&self) -> Result<AvailabilitySummary, LedgerError> {
        let numbers = self.store.snapshot().await?;
        Ok(AvailabilitySummary::from_numbers(&numbers))
    }

    /// Reserve every number in `numbers`, or none of them.
    ///
    /// Returns `false` without mutating anything when at least one number is
    /// not available.
    #[instrument(skip(self), fields(count = numbers.len()))]
    pub async fn reserve(&self, numbers: &BTreeSet<u16>) -> Result<bool, LedgerError> {
        let _writer = self.writer.lock().await;

        let unavailable = self.unavailable_among(numbers).await?;
        if !unavailable.is_empty() {
            debug!(?unavailable, "Reservation refused");
            return Ok(false);
        }

        let mut applied = Vec::with_capacity(numbers.len());
        for &number in numbers {
            match self
                .store
                .compare_and_set(number, NumberStatus::Available, NumberStatus::Reserved)
                .await
            {
                Ok(true) => applied.push(number),
                Ok(false) => {
                    warn!(number, "Number taken by another writer during reservation");
                    self.undo(&applied).await;
                    return Ok(false);
                }
                Err(e) => {
                    self.undo(&applied).await;
                    return Err(e);
                }
            }
        }

        info!(numbers = ?applied, "Numbers reserved");
        Ok(true)
    }

    /// Return reserved numbers to sale after a submission could not be
    /// completed.
    #[instrument(skip(self), fields(count = numbers.len()))]
    pub async fn release(&self, numbers: &BTreeSet<u16>) -> Result<(), LedgerError> {
        let _writer = self.writer.lock().await;

        for &number in numbers {
            let released = self
                .store
                .compare_and_set(number, NumberStatus::Reserved, NumberStatus::Available)
                .await?;
            if !released {
                warn!(number, "Released number was not reserved");
            }
        }

        info!(numbers = ?numbers, "Numbers released");
        Ok(())
    }

    /// Roll back a partially applied reservation.
    async fn undo(&self, applied: &[u16]) {
        for &number in applied {
            if let Err(e) = self
                .store
                .compare_and_set(number, NumberStatus::Reserved, NumberStatus::Available)
                .await
            {
                error!(number, error = %e, "Failed to roll back reservation");
            }
        }
    }
}
