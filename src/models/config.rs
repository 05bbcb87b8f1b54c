//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream feed retrieval settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Record identity settings
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Persistent store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Calendar used for the write window and query defaults
    #[serde(default)]
    pub clock: ClockConfig,

    /// Query API settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.identity.secret.trim().is_empty() {
            return Err(AppError::validation(
                "identity.secret is empty (set FORECAST_ID_SECRET)",
            ));
        }
        if self.feed.states.is_empty() {
            return Err(AppError::validation("No feed states defined"));
        }
        if let Some((state, _)) = self.feed.states.iter().find(|(_, p)| p.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "feed.states.{state} has an empty path"
            )));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.store.timeout_secs == 0 {
            return Err(AppError::validation("store.timeout_secs must be > 0"));
        }
        if self.store.backend == StoreBackend::DynamoDb && self.store.table.trim().is_empty() {
            return Err(AppError::validation("store.table is empty"));
        }
        self.clock.offset()?;
        Ok(())
    }

    /// The configured state mapping, optionally restricted to `only`.
    ///
    /// Unknown codes in `only` are ignored with a warning.
    pub fn selected_states(&self, only: &[String]) -> BTreeMap<String, String> {
        if only.is_empty() {
            return self.feed.states.clone();
        }
        for code in only {
            if !self.feed.states.contains_key(code) {
                log::warn!("State '{}' is not configured; skipping", code);
            }
        }
        self.feed
            .states
            .iter()
            .filter(|(code, _)| only.contains(code))
            .map(|(code, path)| (code.clone(), path.clone()))
            .collect()
    }
}

/// How feed files are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedTransport {
    #[default]
    Ftp,
    Http,
    File,
}

/// Upstream feed retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub transport: FeedTransport,

    /// FTP host
    #[serde(default = "defaults::ftp_host")]
    pub host: String,

    #[serde(default = "defaults::ftp_port")]
    pub port: u16,

    #[serde(default = "defaults::ftp_username")]
    pub username: String,

    #[serde(default = "defaults::ftp_password")]
    pub password: String,

    /// Base URL for the HTTP transport; the product file name is appended
    #[serde(default = "defaults::http_base_url")]
    pub http_base_url: String,

    /// Directory holding product files for the file transport
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,

    /// Retrieval timeout in seconds
    #[serde(default = "defaults::feed_timeout")]
    pub timeout_secs: u64,

    /// State code to remote product path
    #[serde(default = "defaults::states")]
    pub states: BTreeMap<String, String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            transport: FeedTransport::default(),
            host: defaults::ftp_host(),
            port: defaults::ftp_port(),
            username: defaults::ftp_username(),
            password: defaults::ftp_password(),
            http_base_url: defaults::http_base_url(),
            local_dir: defaults::local_dir(),
            timeout_secs: defaults::feed_timeout(),
            states: defaults::states(),
        }
    }
}

/// Record identity settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// HMAC key for primary IDs. Changing it changes every ID.
    #[serde(default)]
    pub secret: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Which store adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Local,
    #[serde(rename = "dynamodb")]
    DynamoDb,
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// DynamoDB table name
    #[serde(default = "defaults::table")]
    pub table: String,

    /// AWS region for DynamoDB
    #[serde(default = "defaults::region")]
    pub region: String,

    /// JSON file used by the local backend
    #[serde(default = "defaults::local_path")]
    pub local_path: String,

    /// Per-call timeout in seconds
    #[serde(default = "defaults::store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            table: defaults::table(),
            region: defaults::region(),
            local_path: defaults::local_path(),
            timeout_secs: defaults::store_timeout(),
        }
    }
}

/// Calendar settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Fixed UTC offset such as `+10:00`; the host's local zone when unset
    #[serde(default)]
    pub utc_offset: Option<String>,
}

impl ClockConfig {
    /// Parse the configured offset.
    pub fn offset(&self) -> Result<Option<FixedOffset>> {
        self.utc_offset
            .as_deref()
            .map(|raw| {
                raw.parse::<FixedOffset>()
                    .map_err(|e| AppError::config(format!("invalid clock.utc_offset '{raw}': {e}")))
            })
            .transpose()
    }
}

/// Query API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    // Feed defaults
    pub fn ftp_host() -> String {
        "ftp.bom.gov.au".into()
    }
    pub fn ftp_port() -> u16 {
        21
    }
    pub fn ftp_username() -> String {
        "anonymous".into()
    }
    pub fn ftp_password() -> String {
        "guest".into()
    }
    pub fn http_base_url() -> String {
        "http://www.bom.gov.au/fwo".into()
    }
    pub fn local_dir() -> String {
        "data/feeds".into()
    }
    pub fn feed_timeout() -> u64 {
        30
    }

    // Only NSW by default; every extra state multiplies store writes.
    pub fn states() -> BTreeMap<String, String> {
        BTreeMap::from([("nsw".to_string(), "/anon/gen/fwo/IDN11060.xml".to_string())])
    }

    // Store defaults
    pub fn table() -> String {
        "weather-forecasts".into()
    }
    pub fn region() -> String {
        "ap-southeast-2".into()
    }
    pub fn local_path() -> String {
        "data/forecasts.json".into()
    }
    pub fn store_timeout() -> u64 {
        10
    }

    // Server defaults
    pub fn bind() -> String {
        "0.0.0.0:8000".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.identity.secret = "test-secret".to_string();
        config
    }

    #[test]
    fn validate_requires_secret() {
        assert!(Config::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.feed.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_offset() {
        let mut config = valid_config();
        config.clock.utc_offset = Some("ten hours".to_string());
        assert!(config.validate().is_err());

        config.clock.utc_offset = Some("+10:00".to_string());
        assert_eq!(
            config.clock.offset().unwrap(),
            FixedOffset::east_opt(10 * 3600)
        );
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [feed]
            transport = "file"

            [feed.states]
            vic = "/anon/gen/fwo/IDV10753.xml"

            [store]
            backend = "dynamodb"
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.transport, FeedTransport::File);
        assert_eq!(config.feed.port, 21);
        assert_eq!(config.feed.states.len(), 1);
        assert_eq!(config.store.backend, StoreBackend::DynamoDb);
        assert_eq!(config.store.table, "weather-forecasts");
    }

    #[test]
    fn selected_states_filters_mapping() {
        let mut config = valid_config();
        config
            .feed
            .states
            .insert("vic".to_string(), "/anon/gen/fwo/IDV10753.xml".to_string());

        assert_eq!(config.selected_states(&[]).len(), 2);
        let only_vic = config.selected_states(&["vic".to_string(), "wa".to_string()]);
        assert_eq!(only_vic.keys().collect::<Vec<_>>(), vec!["vic"]);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = valid_config();
        let rendered = format!("{:?}", config.identity);
        assert!(!rendered.contains("test-secret"));
    }
}
