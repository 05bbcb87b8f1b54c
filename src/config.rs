// src/config.rs

//! Configuration loading utilities.
//!
//! Configuration comes from a TOML file and is then overridden by environment
//! variables, which is how the Lambda deployments set secrets and table names.
//!
//! ## Environment Variables
//!
//! - `FORECAST_CONFIG`: config file path (default: `data/config.toml`)
//! - `FORECAST_ID_SECRET`: HMAC key for primary IDs
//! - `FORECAST_TABLE`: DynamoDB table name
//! - `FORECAST_STORE`: store backend (`memory`, `local`, `dynamodb`)
//! - `FEED_TRANSPORT`: feed transport (`ftp`, `http`, `file`)
//! - `FEED_TIMEOUT_SECS`: feed retrieval timeout
//! - `FORECAST_STATES`: comma-separated state codes to keep from the mapping
//! - `BIND_ADDR`: query API listen address

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, FeedTransport, StoreBackend};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Config {
    Config::load_or_default(path)
}

/// Apply environment overrides using the given variable lookup.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("FORECAST_ID_SECRET") {
        config.identity.secret = secret;
    }

    if let Some(table) = lookup("FORECAST_TABLE") {
        config.store.table = table;
    }

    if let Some(backend) = lookup("FORECAST_STORE") {
        config.store.backend = match backend.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "local" => StoreBackend::Local,
            "dynamodb" => StoreBackend::DynamoDb,
            other => return Err(AppError::config(format!("unknown store backend '{other}'"))),
        };
    }

    if let Some(transport) = lookup("FEED_TRANSPORT") {
        config.feed.transport = match transport.to_lowercase().as_str() {
            "ftp" => FeedTransport::Ftp,
            "http" => FeedTransport::Http,
            "file" => FeedTransport::File,
            other => return Err(AppError::config(format!("unknown feed transport '{other}'"))),
        };
    }

    if let Some(timeout) = lookup("FEED_TIMEOUT_SECS") {
        config.feed.timeout_secs = timeout.trim().parse().map_err(|_| {
            AppError::config(format!("FEED_TIMEOUT_SECS is not a number of seconds: '{timeout}'"))
        })?;
    }

    if let Some(states) = lookup("FORECAST_STATES") {
        let only: Vec<String> = states
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        config.feed.states = config.selected_states(&only);
    }

    if let Some(bind) = lookup("BIND_ADDR") {
        config.server.bind = bind;
    }

    Ok(())
}

/// Load, override from the process environment, and validate.
pub fn load_runtime_config(path: Option<&Path>) -> Result<Config> {
    let env_path = std::env::var("FORECAST_CONFIG").ok();
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| env_path.map(Into::into))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());

    let mut config = load_config(&path);
    apply_overrides(&mut config, |name| std::env::var(name).ok())?;
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    log::info!(
        "Loaded configuration from {} ({} state(s), {:?} store)",
        path.display(),
        config.feed.states.len(),
        config.store.backend
    );
    Ok(config)
}
