// src/error.rs

//! Unified error handling for the watch engine.
//!
//! `AppError` is what callers of the engine see. `FetchError` and
//! `NotifyError` describe failures of the external collaborators; they are
//! absorbed inside a polling cycle and only ever logged or counted.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// The watch set could not be committed; the mutation was rolled back.
    #[error("Watch store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A manual cycle was requested while another one is running.
    #[error("A polling cycle is already in progress")]
    CycleAlreadyInProgress,
}

impl AppError {
    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failure of a single scraper call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("fetch timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected page layout: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Failure to deliver a notification to one recipient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by recipient endpoint: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_message() {
        let err = AppError::store("disk full");
        assert_eq!(err.to_string(), "Watch store error: disk full");
    }

    #[test]
    fn test_cycle_in_progress_message() {
        assert_eq!(
            AppError::CycleAlreadyInProgress.to_string(),
            "A polling cycle is already in progress"
        );
    }
}
