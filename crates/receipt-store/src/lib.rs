//! Payment receipt storage.
//!
//! Receipts are images uploaded by participants as proof of payment. A
//! [`ReceiptStore`] persists the image and returns a durable URL that is
//! recorded alongside the registration.

mod error;
mod http;
mod local;

pub use error::ReceiptError;
pub use http::HttpReceiptStore;
pub use local::LocalReceiptStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::Component;
use std::path::Path;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Durable storage for receipt images.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Store `data` under `folder` and return the URL it can be fetched from.
    async fn upload(&self, data: &[u8], mime_type: &str, folder: &str)
        -> Result<String, ReceiptError>;
}

/// Detect the image type from its leading bytes.
///
/// Only PNG and JPEG are accepted as receipts.
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG_SIGNATURE) {
        Some(MIME_PNG)
    } else if data.starts_with(JPEG_SIGNATURE) {
        Some(MIME_JPEG)
    } else {
        None
    }
}

/// File extension for a supported receipt MIME type.
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        MIME_PNG => Some("png"),
        MIME_JPEG | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// Name a stored receipt: `receipt_{YYYYmmdd_HHMMSS}_{8 hex}.{ext}`.
pub fn receipt_file_name(mime_type: &str, at: DateTime<Utc>) -> Result<String, ReceiptError> {
    let extension =
        extension_for(mime_type).ok_or_else(|| ReceiptError::UnsupportedType(mime_type.into()))?;
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    Ok(format!(
        "receipt_{}_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        &suffix[..8],
        extension
    ))
}

/// SHA-256 of the receipt bytes, hex encoded.
pub fn receipt_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reject folders that are empty, absolute, or climb out of the store root.
pub(crate) fn validate_folder(folder: &str) -> Result<&str, ReceiptError> {
    let trimmed = folder.trim_matches('/');
    let valid = !trimmed.is_empty()
        && !folder.starts_with('/')
        && Path::new(trimmed)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if valid {
        Ok(trimmed)
    } else {
        Err(ReceiptError::InvalidFolder(folder.into()))
    }
}
