// src/lib.rs

//! Forecast Library
//!
//! Ingests the Bureau of Meteorology's per-state précis forecasts into a
//! key-value store and answers per-location, per-day lookups.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod identity;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod transport;
pub mod utils;
