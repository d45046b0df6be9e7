//! In-memory stores, used for tests and when persistence is disabled.

use super::{NumberStore, RegistrationLog};
use crate::error::LedgerError;
use crate::types::{seed_numbers, NewRegistration, NumberStatus, RaffleNumber, Registration};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory number table seeded with every number available.
#[derive(Debug)]
pub struct MemoryNumberStore {
    numbers: RwLock<BTreeMap<u16, NumberStatus>>,
}

impl MemoryNumberStore {
    pub fn new() -> Self {
        Self::from_numbers(seed_numbers())
    }

    /// Start from an existing table.
    pub fn from_numbers(numbers: impl IntoIterator<Item = RaffleNumber>) -> Self {
        Self {
            numbers: RwLock::new(numbers.into_iter().map(|n| (n.number, n.status)).collect()),
        }
    }
}

impl Default for MemoryNumberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NumberStore for MemoryNumberStore {
    async fn snapshot(&self) -> Result<Vec<RaffleNumber>, LedgerError> {
        let numbers = self.numbers.read().await;
        Ok(numbers
            .iter()
            .map(|(&number, &status)| RaffleNumber { number, status })
            .collect())
    }

    async fn compare_and_set(
        &self,
        number: u16,
        expected: NumberStatus,
        new: NumberStatus,
    ) -> Result<bool, LedgerError> {
        let mut numbers = self.numbers.write().await;
        let status = numbers
            .get_mut(&number)
            .ok_or(LedgerError::UnknownNumber(number))?;

        if *status != expected {
            return Ok(false);
        }
        *status = new;
        Ok(true)
    }
}

/// In-memory registration log.
#[derive(Debug, Default)]
pub struct MemoryRegistrationLog {
    registrations: RwLock<Vec<Registration>>,
}

impl MemoryRegistrationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationLog for MemoryRegistrationLog {
    async fn append(&self, entry: NewRegistration) -> Result<Registration, LedgerError> {
        let mut registrations = self.registrations.write().await;
        let registration = Registration::record(registrations.len() as u64 + 1, entry);
        debug!(id = registration.id, "Memory log: registration appended");
        registrations.push(registration.clone());
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>, LedgerError> {
        Ok(self.registrations.read().await.clone())
    }

    async fn count(&self) -> Result<usize, LedgerError> {
        Ok(self.registrations.read().await.len())
    }
}
