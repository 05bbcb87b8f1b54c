// src/error.rs

//! Unified error handling for the forecast service.

use std::fmt;

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Feed retrieval failed (dial, login, retrieve)
    #[error("Transport error ({stage}): {message}")]
    Transport { stage: String, message: String },

    /// Persistent store failed
    #[error("Store error: {0}")]
    Store(String),

    /// A stored item could not be turned back into a record
    #[error("Decode error: {0}")]
    Decode(String),

    /// An I/O boundary did not answer in time
    #[error("Timed out after {seconds}s while {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// XML reading failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query date could not be parsed
    #[error("{0}")]
    InvalidDate(String),

    /// No stored forecast matched the query
    #[error("location not found")]
    NotFound,
}

impl AppError {
    /// Create a transport error for the given stage.
    pub fn transport(stage: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            stage: stage.into(),
            message: message.to_string(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller sent something unusable, as opposed to a backend fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidDate(_))
    }
}
