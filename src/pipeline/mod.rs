// src/pipeline/mod.rs

//! Ingestion pipeline: fetch, parse, normalize, window, upsert.

pub mod ingest;
pub mod window;

pub use ingest::{IngestReport, IngestionOrchestrator, StateReport};
pub use window::{Clock, FixedClock, SystemClock, WriteWindow, eligible_records};
