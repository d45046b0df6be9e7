//! Error types for the raffle service.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use raffle_ledger::{LedgerError, SelectionError};
use receipt_store::ReceiptError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Submission and API errors.
///
/// The display text of each variant is the message shown to the participant.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please enter your name")]
    MissingName,

    #[error("Please enter a valid contact number (10 or 11 digits with area code)")]
    InvalidContact,

    #[error("{0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("These numbers are not available: {}", join_numbers(.0))]
    Unavailable(Vec<u16>),

    #[error("Please upload the payment receipt")]
    MissingReceipt,

    #[error("The receipt must be a PNG or JPEG image")]
    UnsupportedReceipt,

    #[error("The upload is too large")]
    PayloadTooLarge,

    #[error("Reservation failed, please retry")]
    ReservationFailed,

    #[error("Invalid form submission: {0}")]
    BadRequest(String),

    #[error("Could not reach storage, please try again later")]
    Storage(#[source] LedgerError),

    #[error("Could not save the receipt, please try again later")]
    ReceiptUpload(#[source] ReceiptError),

    #[error("Operator access required")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

fn join_numbers(numbers: &[u16]) -> String {
    numbers
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            FormError::MissingName => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_NAME"),
            FormError::InvalidContact => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_CONTACT"),
            FormError::InvalidSelection(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SELECTION")
            }
            FormError::Unavailable(_) => (StatusCode::CONFLICT, "NUMBERS_UNAVAILABLE"),
            FormError::MissingReceipt => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_RECEIPT"),
            FormError::UnsupportedReceipt => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_RECEIPT")
            }
            FormError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            FormError::ReservationFailed => (StatusCode::CONFLICT, "RESERVATION_FAILED"),
            FormError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            FormError::Storage(e) => {
                error!(error = %e, "Storage error");
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
            FormError::ReceiptUpload(e) => {
                error!(error = %e, "Receipt upload error");
                (StatusCode::BAD_GATEWAY, "RECEIPT_UPLOAD_FAILED")
            }
            FormError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            FormError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for FormError {
    fn from(e: LedgerError) -> Self {
        FormError::Storage(e)
    }
}

impl From<ReceiptError> for FormError {
    fn from(e: ReceiptError) -> Self {
        FormError::ReceiptUpload(e)
    }
}

impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FormError::PayloadTooLarge
        } else {
            FormError::BadRequest(e.body_text())
        }
    }
}
