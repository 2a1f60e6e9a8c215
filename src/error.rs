// src/error.rs
//! Error taxonomy shared across the pipeline.
//!
//! Source and notifier errors are recorded at their component boundary and
//! never abort a run. Config errors are meant to fail fast at startup.

use thiserror::Error;

/// Failure of a single source adapter (network, parse, deadline, ...).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("deadline exceeded after {0} ms")]
    DeadlineExceeded(u128),

    #[error("no adapter registered for source `{0}`")]
    Unknown(String),

    #[error("adapter task panicked: {0}")]
    Panicked(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

/// Failure of one notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{channel} responded with status {status}")]
    Status { channel: &'static str, status: u16 },

    #[error("email error: {0}")]
    Email(String),

    #[error("channel misconfigured: {0}")]
    Config(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
