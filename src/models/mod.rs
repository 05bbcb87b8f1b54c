// src/models/mod.rs

//! Domain models for the forecast service.
//!
//! Configuration lives next to the record types so every layer can share
//! one set of definitions.

mod config;
mod forecast;

// Re-export all public types
pub use config::{
    ClockConfig, Config, FeedConfig, FeedTransport, IdentityConfig, ServerConfig, StoreBackend,
    StoreConfig,
};
pub use forecast::{Attributes, DATE_FORMAT, ForecastRecord, RejectedPeriod, attr};

#[cfg(test)]
pub(crate) use forecast::sample_record;
