//! Configuration for the raffle service.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Number table and registration log storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Receipt upload configuration
    #[serde(default)]
    pub receipts: ReceiptsConfig,

    /// Raffle details shown to participants
    #[serde(default)]
    pub raffle: RaffleConfig,

    /// Operator access
    #[serde(default)]
    pub admin: AdminConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted form submission, receipt included
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on restart
    Memory,
    /// JSON files in `data_dir`
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Directory holding `numbers.json` and `registrations.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptBackend {
    Local,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptsConfig {
    #[serde(default = "default_receipt_backend")]
    pub backend: ReceiptBackend,

    /// Root directory for the local backend
    #[serde(default = "default_receipts_dir")]
    pub dir: PathBuf,

    /// Destination folder inside the store
    #[serde(default = "default_receipts_folder")]
    pub folder: String,

    /// Base URL receipts are served from
    pub public_base_url: Option<String>,

    /// Upload endpoint for the http backend
    pub endpoint: Option<String>,

    /// Bearer token for the http backend
    pub api_token: Option<SecretString>,

    /// Upload timeout for the http backend
    #[serde(default = "default_upload_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaffleConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Prize description
    #[serde(default)]
    pub prize: Option<String>,

    /// Price of one number, in cents
    #[serde(default = "default_price_cents")]
    pub price_cents: u64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Where participants send the payment (PIX key, account, ...)
    #[serde(default)]
    pub payment_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for the registration listing; listing is disabled when unset
    pub token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            backend: default_receipt_backend(),
            dir: default_receipts_dir(),
            folder: default_receipts_folder(),
            public_base_url: None,
            endpoint: None,
            api_token: None,
            timeout: default_upload_timeout(),
        }
    }
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            prize: None,
            price_cents: default_price_cents(),
            currency: default_currency(),
            payment_key: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_receipt_backend() -> ReceiptBackend {
    ReceiptBackend::Local
}

fn default_receipts_dir() -> PathBuf {
    PathBuf::from("/data/receipts")
}

fn default_receipts_folder() -> String {
    "receipts".into()
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_title() -> String {
    "Raffle".into()
}

fn default_price_cents() -> u64 {
    600
}

fn default_currency() -> String {
    "BRL".into()
}

fn default_global_rpm() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nested keys use `__`, e.g. `STORAGE__DATA_DIR` or `RAFFLE__PRICE_CENTS`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
