//! HTTP object-storage receipt store.

use crate::{receipt_file_name, validate_folder, ReceiptError, ReceiptStore};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Uploads receipts with `PUT {endpoint}/{folder}/{file}`.
///
/// Works against any object store that accepts plain PUT uploads (an
/// S3-compatible gateway, a WebDAV share, a signed-upload proxy). If the
/// response body is JSON with a `url` field, that URL is returned; otherwise
/// the URL is built from `public_base_url`, falling back to the endpoint.
///
/// The bearer token is stored using `SecretString` to keep it out of logs.
#[derive(Clone)]
pub struct HttpReceiptStore {
    client: Client,
    endpoint: String,
    public_base_url: Option<String>,
    api_token: Option<SecretString>,
}

/// Optional JSON body returned by the object store.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

impl HttpReceiptStore {
    /// Create a new HTTP receipt store.
    pub fn new(
        endpoint: impl Into<String>,
        public_base_url: Option<String>,
        api_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ReceiptError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_token,
        })
    }

    /// Extract error information from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> ReceiptError {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(%status, "Receipt storage rejected credentials");
                ReceiptError::Unauthorized
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                warn!(%status, body = %message, "Receipt upload failed");
                ReceiptError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl ReceiptStore for HttpReceiptStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        data: &[u8],
        mime_type: &str,
        folder: &str,
    ) -> Result<String, ReceiptError> {
        let folder = validate_folder(folder)?;
        let file_name = receipt_file_name(mime_type, Utc::now())?;
        let object_path = format!("{}/{}", folder, file_name);

        let mut request = self
            .client
            .put(format!("{}/{}", self.endpoint, object_path))
            .header("Content-Type", mime_type)
            .body(data.to_vec());
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        let body = response.text().await?;
        let reported = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|r| r.url);

        let url = reported.unwrap_or_else(|| {
            let base = self.public_base_url.as_deref().unwrap_or(&self.endpoint);
            format!("{}/{}", base, object_path)
        });

        debug!(url = %url, "Receipt uploaded");
        Ok(url)
    }
}
