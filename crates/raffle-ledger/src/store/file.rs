//! JSON-file stores.
//!
//! Each store keeps its table in memory and rewrites the whole file after
//! every mutation. Writes go to a temp file first and are renamed into
//! place, so a crash never leaves a half-written table behind.
//!
//! A store holds an exclusive lock on `<file>.lock` for as long as it is
//! open. Only one store (in one process) may own a data file at a time; a
//! second `open` on the same path fails with [`LedgerError::Locked`].

use super::{NumberStore, RegistrationLog};
use crate::error::LedgerError;
use crate::types::{
    NewRegistration, NumberStatus, RaffleNumber, Registration, FIRST_NUMBER, LAST_NUMBER,
};
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Data version for schema migrations.
const DATA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct NumbersFile {
    version: u32,
    numbers: Vec<RaffleNumber>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistrationsFile {
    version: u32,
    registrations: Vec<Registration>,
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Read a file, treating a missing or empty file as absent.
async fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, LedgerError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).await?;
    Ok((!data.iter().all(u8::is_ascii_whitespace)).then_some(data))
}

/// Take the exclusive lock guarding `path`. The lock is released when the
/// returned file is closed, including when the process dies.
async fn acquire_lock(path: &Path) -> Result<std::fs::File, LedgerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
    lock_name.push(".lock");
    let lock_path = path.with_file_name(lock_name);

    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;

    if lock_file.try_lock_exclusive().is_err() {
        warn!(path = ?path, "Data file already locked");
        return Err(LedgerError::Locked(path.to_path_buf()));
    }
    Ok(lock_file)
}

fn check_version(found: u32) -> Result<(), LedgerError> {
    if found != DATA_VERSION {
        return Err(LedgerError::UnsupportedVersion {
            found,
            expected: DATA_VERSION,
        });
    }
    Ok(())
}

/// Number table persisted as a JSON file.
pub struct FileNumberStore {
    numbers: RwLock<BTreeMap<u16, NumberStatus>>,
    path: PathBuf,
    _lock: std::fs::File,
}

impl FileNumberStore {
    /// Open the table at `path`, seeding 1..=250 as available on first use.
    ///
    /// Entries outside 1..=250 are dropped.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let lock = acquire_lock(&path).await?;

        let mut numbers = BTreeMap::new();
        let mut dropped = 0;
        if let Some(data) = read_existing(&path).await? {
            let file: NumbersFile = serde_json::from_slice(&data)?;
            check_version(file.version)?;
            for entry in file.numbers {
                if (FIRST_NUMBER..=LAST_NUMBER).contains(&entry.number) {
                    numbers.insert(entry.number, entry.status);
                } else {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            warn!(dropped, path = ?path, "Ignoring out-of-range numbers in table");
        }

        let loaded = numbers.len();
        for number in FIRST_NUMBER..=LAST_NUMBER {
            numbers.entry(number).or_insert(NumberStatus::Available);
        }
        let seeded = numbers.len() - loaded;

        if seeded > 0 || dropped > 0 {
            if loaded == 0 {
                info!(path = ?path, "Seeding number table");
            } else if seeded > 0 {
                warn!(seeded, path = ?path, "Number table incomplete, missing numbers added as available");
            }
            Self::persist(&path, &numbers).await?;
        }

        info!(
            path = ?path,
            reserved = numbers.values().filter(|s| **s == NumberStatus::Reserved).count(),
            "Loaded number table"
        );

        Ok(Self {
            numbers: RwLock::new(numbers),
            path,
            _lock: lock,
        })
    }

    async fn persist(path: &Path, numbers: &BTreeMap<u16, NumberStatus>) -> Result<(), LedgerError> {
        let file = NumbersFile {
            version: DATA_VERSION,
            numbers: numbers
                .iter()
                .map(|(&number, &status)| RaffleNumber { number, status })
                .collect(),
        };
        let data = serde_json::to_vec_pretty(&file)?;
        write_atomic(path, &data).await?;
        debug!("Saved number table ({} bytes) to {:?}", data.len(), path);
        Ok(())
    }
}

#[async_trait]
impl NumberStore for FileNumberStore {
    async fn snapshot(&self) -> Result<Vec<RaffleNumber>, LedgerError> {
        let numbers = self.numbers.read().await;
        Ok(numbers
            .iter()
            .map(|(&number, &status)| RaffleNumber { number, status })
            .collect())
    }

    async fn compare_and_set(
        &self,
        number: u16,
        expected: NumberStatus,
        new: NumberStatus,
    ) -> Result<bool, LedgerError> {
        let mut numbers = self.numbers.write().await;
        let status = numbers
            .get_mut(&number)
            .ok_or(LedgerError::UnknownNumber(number))?;

        if *status != expected {
            return Ok(false);
        }
        *status = new;

        if let Err(e) = Self::persist(&self.path, &numbers).await {
            numbers.insert(number, expected);
            return Err(e);
        }
        Ok(true)
    }
}

/// Registration log persisted as a JSON file.
pub struct FileRegistrationLog {
    registrations: RwLock<Vec<Registration>>,
    path: PathBuf,
    _lock: std::fs::File,
}

impl FileRegistrationLog {
    /// Open the log at `path`; a missing file is an empty log.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let lock = acquire_lock(&path).await?;

        let registrations = match read_existing(&path).await? {
            Some(data) => {
                let file: RegistrationsFile = serde_json::from_slice(&data)?;
                check_version(file.version)?;
                file.registrations
            }
            None => {
                info!(path = ?path, "Registration log not found, starting empty");
                Vec::new()
            }
        };

        info!(
            path = ?path,
            count = registrations.len(),
            "Loaded registration log"
        );

        Ok(Self {
            registrations: RwLock::new(registrations),
            path,
            _lock: lock,
        })
    }

    async fn persist(&self, registrations: &[Registration]) -> Result<(), LedgerError> {
        let file = RegistrationsFile {
            version: DATA_VERSION,
            registrations: registrations.to_vec(),
        };
        let data = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &data).await?;
        debug!("Saved registration log ({} bytes) to {:?}", data.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl RegistrationLog for FileRegistrationLog {
    async fn append(&self, entry: NewRegistration) -> Result<Registration, LedgerError> {
        let mut registrations = self.registrations.write().await;
        let registration = Registration::record(registrations.len() as u64 + 1, entry);
        registrations.push(registration.clone());

        if let Err(e) = self.persist(&registrations).await {
            registrations.pop();
            return Err(e);
        }
        Ok(registration)
    }

    async fn list(&self) -> Result<Vec<Registration>, LedgerError> {
        Ok(self.registrations.read().await.clone())
    }

    async fn count(&self) -> Result<usize, LedgerError> {
        Ok(self.registrations.read().await.len())
    }
}
