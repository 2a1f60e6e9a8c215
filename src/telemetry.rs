// src/telemetry.rs
//! Tracing setup for the binary. Libraries and tests never install a
//! subscriber themselves.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FILTER: &str = "RADAR_LOG";
pub const ENV_LOG_JSON: &str = "RADAR_LOG_JSON";

const DEFAULT_FILTER: &str = "social_radar=info,radar=info,warn";

/// Install the global subscriber.
/// - filter from `RADAR_LOG` (EnvFilter syntax), else `RUST_LOG`, else a sane default
/// - `RADAR_LOG_JSON=1` switches to JSON lines
///
/// Safe to call twice; the second call is a no-op.
pub fn init_tracing() {
    let filter = std::env::var(ENV_LOG_FILTER)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_JSON)
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(false))
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
