// src/sources/mod.rs
pub mod instagram;
pub mod tiktok;

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

use crate::config::SourceSettings;
use crate::error::SourceError;

/// Where an offline adapter gets its payload from.
#[derive(Debug, Clone)]
pub enum PayloadMode {
    /// Payload held in memory (tests, embedded fixtures).
    Inline(String),
    /// Recorded payload on disk, read on every fetch.
    File(PathBuf),
    /// Built-in sample batch.
    Sample,
}

impl PayloadMode {
    pub fn from_settings(s: &SourceSettings) -> Self {
        match &s.fixture {
            Some(p) => PayloadMode::File(p.clone()),
            None => PayloadMode::Sample,
        }
    }

    /// Payload text, or `None` for the sample batch.
    pub(crate) async fn load(&self) -> Result<Option<String>, SourceError> {
        match self {
            PayloadMode::Inline(s) => Ok(Some(s.clone())),
            PayloadMode::File(p) => Ok(Some(tokio::fs::read_to_string(p).await?)),
            PayloadMode::Sample => Ok(None),
        }
    }
}

/// Platforms report counters as numbers or numeric strings; anything else is 0.
pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(value_u64(&v))
}

pub(crate) fn value_u64(v: &serde_json::Value) -> u64 {
    match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Ids arrive as strings or bare numbers depending on the endpoint.
pub(crate) fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(value_string(&v))
}

pub(crate) fn value_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unix seconds → timestamp; 0 and out-of-range values are treated as unknown.
pub(crate) fn unix_to_utc(secs: u64) -> Option<chrono::DateTime<chrono::Utc>> {
    if secs == 0 {
        return None;
    }
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
}
