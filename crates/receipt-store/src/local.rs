//! Local-directory receipt store.

use crate::{receipt_file_name, validate_folder, ReceiptError, ReceiptStore};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, instrument};

/// Writes receipts under a root directory.
///
/// URLs point at `public_base_url` when configured (for a directory served
/// by a static file server), otherwise at the file itself.
#[derive(Debug, Clone)]
pub struct LocalReceiptStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalReceiptStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl ReceiptStore for LocalReceiptStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        data: &[u8],
        mime_type: &str,
        folder: &str,
    ) -> Result<String, ReceiptError> {
        let folder = validate_folder(folder)?;
        let file_name = receipt_file_name(mime_type, Utc::now())?;

        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&file_name);
        fs::write(&path, data).await?;
        debug!(path = ?path, "Receipt written");

        let url = match &self.public_base_url {
            Some(base) => format!("{}/{}/{}", base, folder, file_name),
            None => format!("file://{}", fs::canonicalize(&path).await?.display()),
        };
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MIME_JPEG, MIME_PNG};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalReceiptStore::new(dir.path(), None);

        let url = store.upload(b"jpeg bytes", MIME_JPEG, "receipts").await.unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with(".jpg"));

        let path = PathBuf::from(url.trim_start_matches("file://"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");
        assert!(path.starts_with(dir.path().canonicalize().unwrap().join("receipts")));
    }

    #[tokio::test]
    async fn test_upload_with_public_base_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalReceiptStore::new(
            dir.path(),
            Some("https://raffle.example/receipts-static/".into()),
        );

        let url = store.upload(b"png bytes", MIME_PNG, "2025").await.unwrap();

        assert!(url.starts_with("https://raffle.example/receipts-static/2025/receipt_"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_folder() {
        let dir = TempDir::new().unwrap();
        let store = LocalReceiptStore::new(dir.path(), None);

        let result = store.upload(b"data", MIME_PNG, "../elsewhere").await;
        assert!(matches!(result, Err(ReceiptError::InvalidFolder(_))));
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let store = LocalReceiptStore::new(dir.path(), None);

        let result = store.upload(b"data", "image/gif", "receipts").await;
        assert!(matches!(result, Err(ReceiptError::UnsupportedType(_))));
    }
}
