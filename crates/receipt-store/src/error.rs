//! Receipt storage errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage rejected credentials")]
    Unauthorized,

    #[error("Storage error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid destination folder: {0}")]
    InvalidFolder(String),

    #[error("Unsupported receipt type: {0}")]
    UnsupportedType(String),
}
