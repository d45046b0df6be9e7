//! Registration form processing.
//!
//! A submission is validated in a fixed order and stops at the first
//! failure without touching any store:
//!
//! 1. name present
//! 2. contact number valid
//! 3. number list parses, deduplicated, within range
//! 4. every number currently available
//! 5. receipt present and a PNG or JPEG image
//!
//! A valid submission uploads the receipt, reserves the numbers and only
//! then appends the registration. If the append fails the numbers are
//! released again, so the log never holds an entry without a reservation.

use crate::error::FormError;
use raffle_ledger::{
    is_valid_contact, parse_selection, NewRegistration, NumberLedger, Registration,
    RegistrationLog,
};
use receipt_store::{detect_image_type, receipt_digest, ReceiptStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// An uploaded receipt file as received from the form.
#[derive(Debug, Clone, Default)]
pub struct ReceiptUpload {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    /// Content type declared by the client; the stored type is sniffed from the bytes
    pub content_type: Option<String>,
}

/// Raw form fields.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub contact: String,
    /// Comma-separated numbers, e.g. `"1, 5, 23"`
    pub numbers: String,
    pub receipt: Option<ReceiptUpload>,
}

/// A submission that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedForm {
    pub name: String,
    pub contact: String,
    pub numbers: BTreeSet<u16>,
    pub receipt: Vec<u8>,
    pub receipt_type: &'static str,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub registration: Registration,
    pub amount_due_cents: u64,
}

/// Orchestrates validation, receipt upload, reservation and logging.
pub struct FormController {
    ledger: Arc<NumberLedger>,
    registrations: Arc<dyn RegistrationLog>,
    receipts: Arc<dyn ReceiptStore>,
    receipt_folder: String,
    price_cents: u64,
}

impl FormController {
    pub fn new(
        ledger: Arc<NumberLedger>,
        registrations: Arc<dyn RegistrationLog>,
        receipts: Arc<dyn ReceiptStore>,
        receipt_folder: impl Into<String>,
        price_cents: u64,
    ) -> Self {
        Self {
            ledger,
            registrations,
            receipts,
            receipt_folder: receipt_folder.into(),
            price_cents,
        }
    }

    pub fn ledger(&self) -> &NumberLedger {
        &self.ledger
    }

    pub fn registrations(&self) -> &dyn RegistrationLog {
        self.registrations.as_ref()
    }

    /// Run every check against the current state of the ledger.
    pub async fn validate(&self, form: &RegistrationForm) -> Result<ValidatedForm, FormError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }

        if !is_valid_contact(&form.contact) {
            return Err(FormError::InvalidContact);
        }

        let numbers = parse_selection(&form.numbers)?;

        let unavailable = self.ledger.unavailable_among(&numbers).await?;
        if !unavailable.is_empty() {
            return Err(FormError::Unavailable(unavailable));
        }

        let receipt = match &form.receipt {
            Some(upload) if !upload.data.is_empty() => upload,
            _ => return Err(FormError::MissingReceipt),
        };
        let Some(receipt_type) = detect_image_type(&receipt.data) else {
            debug!(
                file_name = ?receipt.file_name,
                declared = ?receipt.content_type,
                "Receipt is not a PNG or JPEG image"
            );
            return Err(FormError::UnsupportedReceipt);
        };
        if let Some(declared) = receipt.content_type.as_deref() {
            if declared != receipt_type {
                debug!(
                    file_name = ?receipt.file_name,
                    declared,
                    detected = receipt_type,
                    "Declared receipt type differs from its content"
                );
            }
        }

        Ok(ValidatedForm {
            name: name.to_string(),
            contact: form.contact.trim().to_string(),
            numbers,
            receipt: receipt.data.clone(),
            receipt_type,
        })
    }

    /// Validate and record a submission.
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: RegistrationForm) -> Result<Confirmation, FormError> {
        let valid = self.validate(&form).await?;
        let receipt_sha256 = receipt_digest(&valid.receipt);

        let receipt_url = self
            .receipts
            .upload(&valid.receipt, valid.receipt_type, &self.receipt_folder)
            .await?;

        if !self.ledger.reserve(&valid.numbers).await? {
            warn!(numbers = ?valid.numbers, "Numbers taken between validation and reservation");
            return Err(FormError::ReservationFailed);
        }

        let entry = NewRegistration {
            name: valid.name,
            contact: valid.contact,
            numbers: valid.numbers.iter().copied().collect(),
            receipt_url,
            receipt_sha256: Some(receipt_sha256),
        };

        let registration = match self.registrations.append(entry).await {
            Ok(registration) => registration,
            Err(e) => {
                error!(error = %e, "Failed to record registration, releasing numbers");
                if let Err(release_error) = self.ledger.release(&valid.numbers).await {
                    error!(error = %release_error, numbers = ?valid.numbers, "Failed to release numbers");
                }
                return Err(e.into());
            }
        };

        info!(
            registration_id = registration.id,
            numbers = ?registration.numbers,
            "Registration recorded"
        );

        Ok(Confirmation {
            amount_due_cents: self
                .price_cents
                .saturating_mul(registration.numbers.len() as u64),
            registration,
        })
    }
}
