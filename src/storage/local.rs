//! Local filesystem storage implementation.
//!
//! Keeps the whole table in one JSON document for development and testing.
//! Production deployments should use the DynamoDB backend.
//!
//! ## Storage Layout
//!
//! ```text
//! forecasts.json
//! {
//!   "<primary id>": { "id": "...", "secondaryID": "...", "date": "...", ... },
//!   ...
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Attributes, ForecastRecord, attr};
use crate::storage::ForecastStore;

type Table = BTreeMap<String, Attributes>;

/// Single-file JSON storage backend.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a LocalStore backed by the given file. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_table(&self) -> Result<Table> {
        match self.read_bytes().await? {
            Some(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::decode(format!("{} is not a forecast table: {e}", self.path.display()))
            }),
            _ => Ok(Table::new()),
        }
    }

    async fn scan<F>(&self, keep: F) -> Result<Vec<ForecastRecord>>
    where
        F: Fn(&Attributes) -> bool + Send,
    {
        self.read_table()
            .await?
            .values()
            .filter(|attrs| keep(attrs))
            .map(ForecastRecord::from_attributes)
            .collect()
    }
}

#[async_trait]
impl ForecastStore for LocalStore {
    async fn upsert(&self, record: &ForecastRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.read_table().await?;
        table.insert(record.id.clone(), record.attributes());

        let bytes = serde_json::to_vec_pretty(&table)?;
        self.write_bytes(&bytes).await?;

        log::debug!("Stored {} in {}", record.id, self.path.display());
        Ok(())
    }

    async fn scan_by_secondary_id(&self, secondary_id: &str) -> Result<Vec<ForecastRecord>> {
        self.scan(|attrs| attrs.get(attr::SECONDARY_ID).map(String::as_str) == Some(secondary_id))
            .await
    }

    async fn scan_older_than(&self, date: NaiveDate) -> Result<Vec<ForecastRecord>> {
        let mut older = self.scan(|_| true).await?;
        older.retain(|record| record.date < date);
        Ok(older)
    }
}
