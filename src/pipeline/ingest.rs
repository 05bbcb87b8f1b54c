// src/pipeline/ingest.rs

//! Forecast ingestion pipeline.
//!
//! For each configured state, in order:
//! 1. Retrieve the product file through the feed source
//! 2. Parse and normalize it into records
//! 3. Keep records inside the write window
//! 4. Upsert them by primary ID
//!
//! A failing state is logged and abandoned; the remaining states still run.
//! Nothing is retried within a run.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::feed::{RecordNormalizer, parse_product};
use crate::identity::IdentityKey;
use crate::models::{Config, ForecastRecord};
use crate::pipeline::window::{Clock, SystemClock, WriteWindow};
use crate::storage::{self, ForecastStore};
use crate::transport::{self, FeedSource};

/// Tallies for one state.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StateReport {
    pub state: String,
    pub remote_path: String,
    /// Forecast periods found under location areas
    pub total: usize,
    /// Periods that became records
    pub parsed: usize,
    /// Records inside the write window
    pub eligible: usize,
    /// Records the store accepted
    pub written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateReport {
    fn new(state: &str, remote_path: &str) -> Self {
        Self {
            state: state.to_string(),
            remote_path: remote_path.to_string(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub states: Vec<StateReport>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.states.iter().map(|s| s.total).sum()
    }

    pub fn parsed(&self) -> usize {
        self.states.iter().map(|s| s.parsed).sum()
    }

    pub fn eligible(&self) -> usize {
        self.states.iter().map(|s| s.eligible).sum()
    }

    pub fn written(&self) -> usize {
        self.states.iter().map(|s| s.written).sum()
    }

    pub fn failed_states(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|s| !s.succeeded())
            .map(|s| s.state.as_str())
            .collect()
    }
}

/// Runs ingestion against injected feed, store and clock.
pub struct IngestionOrchestrator {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn ForecastStore>,
    key: IdentityKey,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
    store_timeout: Duration,
}

impl IngestionOrchestrator {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn ForecastStore>,
        key: IdentityKey,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            key,
            clock,
            fetch_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
        }
    }

    /// Override the per-call timeouts around feed retrieval and store writes.
    pub fn with_timeouts(mut self, fetch: Duration, store: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.store_timeout = store;
        self
    }

    /// Wire up the configured transport, store and clock.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let source = transport::from_config(&config.feed)?;
        let store = storage::open(&config.store).await?;
        let key = IdentityKey::new(&config.identity.secret)?;
        let clock = Arc::new(SystemClock::new(config.clock.offset()?));

        Ok(Self::new(source, store, key, clock).with_timeouts(
            Duration::from_secs(config.feed.timeout_secs),
            Duration::from_secs(config.store.timeout_secs),
        ))
    }

    /// Ingest every state in `states` (code to remote path), one after another.
    pub async fn run(&self, states: &BTreeMap<String, String>) -> IngestReport {
        let started_at = Utc::now();
        let window = WriteWindow::after(self.clock.today());
        log::info!(
            "Ingesting {} state(s); write window {} to {}",
            states.len(),
            window.first,
            window.last
        );

        let mut reports = Vec::with_capacity(states.len());
        for (state, remote_path) in states {
            log::info!("State: {}, File: {}", state, remote_path);

            let mut report = StateReport::new(state, remote_path);
            if let Err(e) = self.ingest_state(state, remote_path, window, &mut report).await {
                log::error!("State {} aborted: {}", state, e);
                report.error = Some(e.to_string());
            }
            reports.push(report);
        }

        let report = IngestReport {
            started_at,
            window_start: window.first,
            window_end: window.last,
            states: reports,
        };
        log::info!(
            "Saved {} records out of {} eligible ({} parsed of {})",
            report.written(),
            report.eligible(),
            report.parsed(),
            report.total()
        );
        report
    }

    async fn ingest_state(
        &self,
        state: &str,
        remote_path: &str,
        window: WriteWindow,
        report: &mut StateReport,
    ) -> Result<()> {
        let bytes = with_timeout(
            "retrieving the feed",
            self.fetch_timeout,
            self.source.fetch(remote_path),
        )
        .await?;

        let records = self.normalize(state, &bytes, report);
        let eligible = window.select(records);
        report.eligible = eligible.len();

        for record in &eligible {
            with_timeout(
                "writing to the store",
                self.store_timeout,
                self.store.upsert(record),
            )
            .await
            .inspect_err(|e| {
                log::error!(
                    "Failed to save record for: {}, date: {}: {}",
                    record.location,
                    record.date,
                    e
                )
            })?;
            report.written += 1;
        }

        log::info!(
            "Saved {} records out of {} for State: {}",
            report.written,
            report.eligible,
            state
        );
        Ok(())
    }

    /// Parse and normalize, counting and logging rejected periods.
    fn normalize(&self, state: &str, bytes: &[u8], report: &mut StateReport) -> Vec<ForecastRecord> {
        let document = parse_product(bytes);
        let outcomes = RecordNormalizer::new(&self.key).normalize(&document, state);
        report.total = outcomes.len();

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(rejected) => log::warn!(
                    "Failed to process record for: {}, start time: {:?}: {}",
                    rejected.location,
                    rejected.start_time_local,
                    rejected.reason
                ),
            }
        }
        report.parsed = records.len();

        log::info!(
            "Processed {} records out of {}, for State: {}",
            report.parsed,
            report.total,
            state
        );
        records
    }
}

/// Bound an I/O call; a timeout becomes [`AppError::Timeout`].
pub(crate) async fn with_timeout<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::timeout(operation, limit.as_secs()))?
}
