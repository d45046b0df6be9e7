//! API response types.

use raffle_ledger::Registration;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub available_count: usize,
    pub registration_count: usize,
}

/// Raffle details shown above the form.
#[derive(Debug, Serialize)]
pub struct RaffleInfoResponse {
    pub title: String,
    pub prize: Option<String>,
    pub price_cents: u64,
    pub currency: String,
    pub payment_key: Option<String>,
    pub first_number: u16,
    pub last_number: u16,
}

/// Numbers that can still be chosen.
#[derive(Debug, Serialize)]
pub struct NumbersResponse {
    pub available: Vec<u16>,
    pub total_available: usize,
    pub lowest: Option<u16>,
    pub highest: Option<u16>,
}

/// Confirmation returned after a successful submission.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: u64,
    pub numbers: Vec<u16>,
    pub receipt_url: String,
    pub amount_due_cents: u64,
    pub currency: String,
    pub message: String,
}

/// Operator listing of all registrations.
#[derive(Debug, Serialize)]
pub struct RegistrationsResponse {
    pub registrations: Vec<RegistrationInfo>,
    pub total: usize,
}

/// Registration entry for listing.
#[derive(Debug, Serialize)]
pub struct RegistrationInfo {
    pub id: u64,
    pub name: String,
    pub contact: String,
    pub numbers: Vec<u16>,
    pub receipt_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_sha256: Option<String>,
    pub created_at: String,
}

impl From<Registration> for RegistrationInfo {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            name: registration.name,
            contact: registration.contact,
            numbers: registration.numbers,
            receipt_url: registration.receipt_url,
            receipt_sha256: registration.receipt_sha256,
            created_at: registration.created_at.to_rfc3339(),
        }
    }
}
