// src/lambda/mod.rs

//! AWS Lambda handler for scheduled ingestion.
//!
//! Each invocation:
//! 1. Loads configuration from the bundled file and environment
//! 2. Restricts the state mapping to the requested states, if any
//! 3. Runs the ingestion pipeline against DynamoDB
//! 4. Reports per-state tallies

use lambda_runtime::{Error as LambdaError, LambdaEvent};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::load_runtime_config;
use crate::error::Result;
use crate::pipeline::{IngestReport, IngestionOrchestrator, StateReport};

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// State codes to ingest (optional, ingests all configured states if empty)
    #[serde(default)]
    pub states: Vec<String>,
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct IngestResponse {
    /// Whether every state was ingested without error
    pub success: bool,

    /// Per-state tallies
    pub states: Vec<StateReport>,

    /// Periods normalized into records
    pub parsed: usize,

    /// Periods found in the feeds
    pub total: usize,

    /// Records inside the write window
    pub eligible: usize,

    /// Records written to the store
    pub written: usize,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        let failed = report.failed_states();
        let error = (!failed.is_empty()).then(|| format!("Failed states: {}", failed.join(", ")));

        Self {
            success: error.is_none(),
            parsed: report.parsed(),
            total: report.total(),
            eligible: report.eligible(),
            written: report.written(),
            error,
            states: report.states,
            execution_time_ms: 0,
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<IngestRequest>,
) -> std::result::Result<IngestResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!("Starting ingestion: states={:?}", request.states);

    match run_ingest(&request).await {
        Ok(mut response) => {
            response.execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Ingestion completed: {} written of {} eligible in {}ms",
                response.written, response.eligible, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Ok(IngestResponse {
                success: false,
                error: Some(e.to_string()),
                execution_time_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            })
        }
    }
}

/// Internal ingestion logic.
async fn run_ingest(request: &IngestRequest) -> Result<IngestResponse> {
    let config = load_runtime_config(None)?;
    let states = config.selected_states(&request.states);

    if states.is_empty() {
        return Ok(IngestResponse {
            success: true,
            error: Some("No matching states configured".to_string()),
            ..Default::default()
        });
    }

    let orchestrator = IngestionOrchestrator::from_config(&config).await?;
    Ok(orchestrator.run(&states).await.into())
}
