//! Ledger data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest raffle number on sale.
pub const FIRST_NUMBER: u16 = 1;

/// Highest raffle number on sale.
pub const LAST_NUMBER: u16 = 250;

/// Availability of a raffle number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NumberStatus {
    /// Free to be picked
    Available,
    /// Taken by a registration
    Reserved,
}

/// A raffle number and its current status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaffleNumber {
    pub number: u16,
    pub status: NumberStatus,
}

impl RaffleNumber {
    /// Create an available number.
    pub fn available(number: u16) -> Self {
        Self {
            number,
            status: NumberStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == NumberStatus::Available
    }
}

/// The initial table: every number in range, all available.
pub fn seed_numbers() -> Vec<RaffleNumber> {
    (FIRST_NUMBER..=LAST_NUMBER)
        .map(RaffleNumber::available)
        .collect()
}

/// A purchase about to be recorded. The log assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub name: String,
    pub contact: String,
    /// Reserved numbers, ascending
    pub numbers: Vec<u16>,
    pub receipt_url: String,
    /// SHA-256 of the receipt image, hex encoded
    pub receipt_sha256: Option<String>,
}

/// A recorded purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    /// Sequential id, starting at 1
    pub id: u64,
    pub name: String,
    pub contact: String,
    pub numbers: Vec<u16>,
    pub receipt_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Stamp a new registration with its id and the current time.
    pub fn record(id: u64, entry: NewRegistration) -> Self {
        Self {
            id,
            name: entry.name,
            contact: entry.contact,
            numbers: entry.numbers,
            receipt_url: entry.receipt_url,
            receipt_sha256: entry.receipt_sha256,
            created_at: Utc::now(),
        }
    }
}

/// Overview of what is still on sale.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AvailabilitySummary {
    pub total_available: usize,
    pub total_reserved: usize,
    pub lowest: Option<u16>,
    pub highest: Option<u16>,
}

impl AvailabilitySummary {
    pub fn from_numbers(numbers: &[RaffleNumber]) -> Self {
        let available: Vec<u16> = numbers
            .iter()
            .filter(|n| n.is_available())
            .map(|n| n.number)
            .collect();

        Self {
            total_available: available.len(),
            total_reserved: numbers.len() - available.len(),
            lowest: available.iter().min().copied(),
            highest: available.iter().max().copied(),
        }
    }
}
