//! In-memory store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Attributes, ForecastRecord, attr};
use crate::storage::ForecastStore;

/// Map of primary ID to attributes. Scans enumerate in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, Attributes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn scan<F>(&self, keep: F) -> Result<Vec<ForecastRecord>>
    where
        F: Fn(&Attributes) -> bool + Send,
    {
        self.items
            .read()
            .await
            .values()
            .filter(|attrs| keep(attrs))
            .map(ForecastRecord::from_attributes)
            .collect()
    }
}

#[async_trait]
impl ForecastStore for MemoryStore {
    async fn upsert(&self, record: &ForecastRecord) -> Result<()> {
        self.items
            .write()
            .await
            .insert(record.id.clone(), record.attributes());
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
