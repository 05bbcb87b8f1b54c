//! Service layer for the forecast application.
//!
//! This module contains the read-side business logic:
//! - Query parsing and resolution (`QueryResolver`)

mod query;

pub use query::{COMPACT_DATE_FORMAT, ForecastQuery, QueryResolver, disambiguate};
