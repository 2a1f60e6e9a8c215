// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod filter;
pub mod notify;
pub mod record;
pub mod results;
pub mod scheduler;
pub mod scorer;
pub mod source;
pub mod sources;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::Aggregator;
pub use crate::config::RadarConfig;
pub use crate::notify::{format_digest, Dispatcher, Notifier};
pub use crate::record::TrendItem;
pub use crate::results::ResultSet;
pub use crate::scheduler::Scheduler;
pub use crate::source::{SourceRegistry, TrendSource};

use tracing::info;

/// One scheduled cycle: aggregate every source, then hand the result to the
/// notification channels.
pub async fn run_and_dispatch(aggregator: &Aggregator, dispatcher: &Dispatcher) -> ResultSet {
    let results = aggregator.run_all().await;
    let report = dispatcher.dispatch(&results).await;
    if !report.outcomes.is_empty() {
        info!(
            target: "radar",
            sent = report.succeeded(),
            failed = report.failed(),
            "dispatch finished"
        );
    }
    results
}
