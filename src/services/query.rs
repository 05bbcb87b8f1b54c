// src/services/query.rs

//! Forecast lookup by location and date.
//!
//! A query is a location optionally suffixed with `, <state>`, plus an
//! optional compact date. Records are found by secondary ID, which ignores
//! state, then narrowed to the requested state when several match.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::identity::secondary_id;
use crate::models::{Config, ForecastRecord};
use crate::pipeline::ingest::with_timeout;
use crate::pipeline::window::{Clock, SystemClock};
use crate::storage::{self, ForecastStore};

/// Layout of the `date` query parameter, e.g. `20230601`.
pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

const COMPACT_DATE_LEN: usize = 8;

/// A parsed lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub location: String,
    pub state: Option<String>,
    pub date: NaiveDate,
}

impl ForecastQuery {
    /// Parse the raw location segment and date parameter.
    ///
    /// A date that is absent or not eight characters long means `today`.
    /// Eight characters that are not a valid `YYYYMMDD` date are rejected.
    pub fn parse(raw_location: &str, raw_date: Option<&str>, today: NaiveDate) -> Result<Self> {
        let (location, state) = match raw_location.split(',').collect::<Vec<_>>().as_slice() {
            [location, state] => {
                let state = state.trim();
                (
                    location.trim().to_string(),
                    (!state.is_empty()).then(|| state.to_string()),
                )
            }
            _ => (raw_location.trim().to_string(), None),
        };

        let date = match raw_date.map(str::trim) {
            Some(raw) if raw.len() == COMPACT_DATE_LEN => {
                NaiveDate::parse_from_str(raw, COMPACT_DATE_FORMAT)
                    .map_err(|_| AppError::InvalidDate("date format is incorrect".to_string()))?
            }
            _ => today,
        };

        Ok(Self {
            location,
            state,
            date,
        })
    }

    /// Lookup key for the store.
    pub fn secondary_id(&self) -> String {
        secondary_id(&self.location, self.date)
    }
}

/// Pick one record among candidates sharing a secondary ID.
///
/// With several candidates the one whose state equals `state` wins;
/// otherwise the first candidate is returned.
pub fn disambiguate(candidates: Vec<ForecastRecord>, state: Option<&str>) -> Option<ForecastRecord> {
    if candidates.len() > 1 {
        if let Some(state) = state {
            if let Some(pos) = candidates.iter().position(|r| r.state == state) {
                return candidates.into_iter().nth(pos);
            }
        }
    }
    candidates.into_iter().next()
}

/// Resolves queries against a forecast store.
pub struct QueryResolver {
    store: Arc<dyn ForecastStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn ForecastStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the configured store and clock.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = storage::open(&config.store).await?;
        let clock = Arc::new(SystemClock::new(config.clock.offset()?));
        Ok(Self::new(store, clock).with_timeout(Duration::from_secs(config.store.timeout_secs)))
    }

    /// Find the forecast for `raw_location` on `raw_date` (or today).
    pub async fn resolve(&self, raw_location: &str, raw_date: Option<&str>) -> Result<ForecastRecord> {
        let query = ForecastQuery::parse(raw_location, raw_date, self.clock.today())?;
        self.resolve_query(&query).await
    }

    pub async fn resolve_query(&self, query: &ForecastQuery) -> Result<ForecastRecord> {
        let key = query.secondary_id();
        let candidates = with_timeout(
            "reading from the store",
            self.timeout,
            self.store.scan_by_secondary_id(&key),
        )
        .await?;

        log::debug!("{} candidate(s) for {}", candidates.len(), key);
        disambiguate(candidates, query.state.as_deref()).ok_or(AppError::NotFound)
    }

    /// Records dated before `date`, for housekeeping.
    pub async fn stale_before(&self, date: NaiveDate) -> Result<Vec<ForecastRecord>> {
        with_timeout(
            "reading from the store",
            self.timeout,
            self.store.scan_older_than(date),
        )
        .await
    }
}
