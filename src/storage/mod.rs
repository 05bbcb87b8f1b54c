//! Storage abstractions for forecast persistence.
//!
//! Every backend stores records as flat string attributes keyed by primary
//! ID (see [`ForecastRecord::attributes`]):
//!
//! ```text
//! id, secondaryID, location, state, date        always present
//! minTemp, maxTemp, precis, precipitation       only when non-empty
//! ```
//!
//! Backends:
//! - [`MemoryStore`]: process-local map, for tests and dry runs
//! - [`LocalStore`]: one JSON file, for development
//! - `DynamoStore`: DynamoDB table (feature `dynamodb`)

pub mod local;
pub mod memory;

#[cfg(feature = "dynamodb")]
pub mod dynamo;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ForecastRecord, StoreBackend, StoreConfig};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamo::DynamoStore;

/// Trait for forecast storage backends.
///
/// Implementations must tolerate concurrent queries and writes.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Write or overwrite the record stored under its primary ID.
    async fn upsert(&self, record: &ForecastRecord) -> Result<()>;

    /// All records sharing a secondary ID, in backend enumeration order.
    async fn scan_by_secondary_id(&self, secondary_id: &str) -> Result<Vec<ForecastRecord>>;

    /// All records dated strictly before `date`.
    async fn scan_older_than(&self, date: NaiveDate) -> Result<Vec<ForecastRecord>>;
}

/// Open the configured store backend.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn ForecastStore>> {
    let store: Arc<dyn ForecastStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Local => Arc::new(LocalStore::new(&config.local_path)),
        #[cfg(feature = "dynamodb")]
        StoreBackend::DynamoDb => Arc::new(DynamoStore::from_config(config).await?),
        #[cfg(not(feature = "dynamodb"))]
        StoreBackend::DynamoDb => {
            return Err(crate::error::AppError::config(
                "store.backend = \"dynamodb\" requires the `dynamodb` feature",
            ));
        }
    };
    Ok(store)
}
