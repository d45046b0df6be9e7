//! Wiring of the configured storage backends into application state.

use crate::api::AppState;
use crate::config::{Config, ReceiptBackend, StorageBackend};
use crate::form::FormController;
use anyhow::{Context, Result};
use raffle_ledger::{
    FileNumberStore, FileRegistrationLog, MemoryNumberStore, MemoryRegistrationLog, NumberLedger,
    NumberStore, RegistrationLog,
};
use receipt_store::{HttpReceiptStore, LocalReceiptStore, ReceiptStore};
use std::sync::Arc;
use tracing::info;

const NUMBERS_FILE: &str = "numbers.json";
const REGISTRATIONS_FILE: &str = "registrations.json";

/// Open the number table and registration log.
pub async fn open_ledger(config: &Config) -> Result<(NumberLedger, Arc<dyn RegistrationLog>)> {
    let (numbers, registrations): (Arc<dyn NumberStore>, Arc<dyn RegistrationLog>) =
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Persistence disabled, using in-memory storage");
                (
                    Arc::new(MemoryNumberStore::new()),
                    Arc::new(MemoryRegistrationLog::new()),
                )
            }
            StorageBackend::File => {
                let dir = &config.storage.data_dir;
                info!(data_dir = ?dir, "Using file storage");

                let numbers = FileNumberStore::open(dir.join(NUMBERS_FILE))
                    .await
                    .with_context(|| format!("Failed to open number table in {}", dir.display()))?;
                let registrations = FileRegistrationLog::open(dir.join(REGISTRATIONS_FILE))
                    .await
                    .with_context(|| {
                        format!("Failed to open registration log in {}", dir.display())
                    })?;

                (Arc::new(numbers), Arc::new(registrations))
            }
        };

    Ok((NumberLedger::new(numbers), registrations))
}

/// Build the configured receipt store.
pub fn receipt_store(config: &Config) -> Result<Arc<dyn ReceiptStore>> {
    let receipts = &config.receipts;

    let store: Arc<dyn ReceiptStore> = match receipts.backend {
        ReceiptBackend::Local => {
            info!(dir = ?receipts.dir, "Storing receipts on local disk");
            Arc::new(LocalReceiptStore::new(
                receipts.dir.clone(),
                receipts.public_base_url.clone(),
            ))
        }
        ReceiptBackend::Http => {
            let endpoint = receipts
                .endpoint
                .clone()
                .context("RECEIPTS__ENDPOINT is required for the http receipt backend")?;
            info!(endpoint = %endpoint, "Uploading receipts over HTTP");
            Arc::new(
                HttpReceiptStore::new(
                    endpoint,
                    receipts.public_base_url.clone(),
                    receipts.api_token.clone(),
                    receipts.timeout,
                )
                .context("Failed to create receipt upload client")?,
            )
        }
    };

    Ok(store)
}

/// Assemble the application state from configuration.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let (ledger, registrations) = open_ledger(config).await?;
    let receipts = receipt_store(config)?;

    let summary = ledger.summary().await.context("Failed to read number table")?;
    let count = registrations
        .count()
        .await
        .context("Failed to read registration log")?;
    info!(
        available = summary.total_available,
        reserved = summary.total_reserved,
        registrations = count,
        "Ledger loaded"
    );

    let controller = FormController::new(
        Arc::new(ledger),
        registrations,
        receipts,
        config.receipts.folder.clone(),
        config.raffle.price_cents,
    );

    Ok(AppState::new(controller, config.raffle.clone())
        .with_admin_token(config.admin.token.clone())
        .with_upload_limit(config.server.max_upload_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        config.storage.data_dir = dir.path().join("data");
        config.receipts.dir = dir.path().join("receipts");
        config
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;

        let state = build_state(&config).await.unwrap();
        let summary = state.controller.ledger().summary().await.unwrap();

        assert_eq!(summary.total_available, 250);
        assert!(state.admin_token.is_none());
    }

    #[tokio::test]
    async fn test_file_backend_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);

        let state = build_state(&config).await.unwrap();
        let numbers: BTreeSet<u16> = [5, 17].into_iter().collect();
        assert!(state.controller.ledger().reserve(&numbers).await.unwrap());
        drop(state);

        assert!(dir.path().join("data").join(NUMBERS_FILE).exists());

        let reopened = build_state(&config).await.unwrap();
        let available = reopened.controller.ledger().list_available().await.unwrap();
        assert_eq!(available.len(), 248);
        assert!(!available.contains(&5));
        assert!(!available.contains(&17));
    }

    #[tokio::test]
    async fn test_http_receipts_require_endpoint() {
        let dir = TempDir::new().unwrap();
        let mut config = file_config(&dir);
        config.receipts.backend = ReceiptBackend::Http;

        let err = build_state(&config).await.err().unwrap();
        assert!(err.to_string().contains("RECEIPTS__ENDPOINT"));

        config.receipts.endpoint = Some("https://storage.example/upload".into());
        assert!(build_state(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_number_table_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join(NUMBERS_FILE), "{not json").unwrap();

        let err = build_state(&config).await.err().unwrap();
        assert!(err.to_string().contains("Failed to open number table"));
    }
}
