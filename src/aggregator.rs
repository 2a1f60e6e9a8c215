// src/aggregator.rs
//! Aggregation run: every enabled source goes through fetch → filter → score
//! in its own task; outcomes are folded into one `ResultSet`. A failing,
//! slow or panicking source only ever produces an entry in `errors`.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RadarConfig;
use crate::error::SourceError;
use crate::filter::ContentFilter;
use crate::record::TrendItem;
use crate::results::ResultSet;
use crate::scorer::TrendScorer;
use crate::source::{FetchContext, SourceRegistry, TrendSource};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_items_total", "Records kept after filter + scoring.");
        describe_counter!("radar_filtered_total", "Records dropped by the content filter.");
        describe_counter!("radar_source_errors_total", "Source fetch/parse failures.");
        describe_counter!(
            "radar_malformed_records_total",
            "Platform records skipped because their shape was unusable."
        );
        describe_histogram!("radar_fetch_ms", "Per-source wall time in milliseconds.");
        describe_gauge!("radar_last_run_ts", "Unix ts when the last aggregation run finished.");
    });
}

struct SourceOutcome {
    name: String,
    result: Result<Vec<TrendItem>, SourceError>,
    elapsed: Duration,
}

pub struct Aggregator {
    config: Arc<RadarConfig>,
    registry: SourceRegistry,
    scorer: TrendScorer,
}

impl Aggregator {
    pub fn new(config: Arc<RadarConfig>, registry: SourceRegistry) -> Self {
        let scorer = TrendScorer::new(
            config.report.trending_score_weight,
            config.report.recency_horizon_hours,
        );
        Self {
            config,
            registry,
            scorer,
        }
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    /// Run every registered source.
    pub async fn run_all(&self) -> ResultSet {
        self.run(None).await
    }

    /// Run the selected sources (all registered ones when `None`).
    /// Names without a registered adapter are recorded as errors.
    pub async fn run(&self, selected: Option<&[String]>) -> ResultSet {
        ensure_metrics_described();

        let started = Instant::now();
        let run_at = Utc::now();
        let mut results = ResultSet::new(run_at);
        // An empty selection means "everything", same as `None`.
        let targets = match selected {
            Some(names) if !names.is_empty() => names.to_vec(),
            _ => self.registry.names(),
        };
        let deadline = self
            .config
            .aggregator
            .run_deadline_secs
            .map(|s| started + Duration::from_secs(s));

        info!(target: "radar", sources = targets.len(), "SocialRadar — Trending Content Aggregator");

        let mut tasks: JoinSet<SourceOutcome> = JoinSet::new();
        let mut seen: HashSet<String> = HashSet::new();
        // Spawned but not yet folded; whatever is left after the join loop never reported back.
        let mut pending: BTreeSet<String> = BTreeSet::new();

        for name in targets {
            if !seen.insert(name.clone()) {
                continue;
            }
            if !self.config.is_enabled(&name) {
                info!(target: "radar", "[{}] skipped (disabled in config)", name.to_uppercase());
                continue;
            }
            let Some(source) = self.registry.build(&name, &self.config) else {
                let err = SourceError::Unknown(name.clone());
                warn!(target: "radar", source = %name, error = %err, "[{}] ERROR — {}", name.to_uppercase(), err);
                counter!("radar_source_errors_total").increment(1);
                results.add_error(name, err.to_string());
                continue;
            };

            let ctx = FetchContext {
                settings: self.config.source(&name),
                deadline,
            };
            let filter = ContentFilter::from_config(self.config.filter_for(&name));
            let scorer = self.scorer.clone();

            info!(target: "radar", "[{}] fetching...", name.to_uppercase());
            pending.insert(name.clone());
            tasks.spawn(async move {
                let t0 = Instant::now();
                // Inner task so a panicking adapter surfaces as a JoinError we can name.
                let inner = tokio::spawn(process_source(source, ctx, filter, scorer, run_at));
                let result = match inner.await {
                    Ok(r) => r,
                    Err(e) => Err(SourceError::Panicked(e.to_string())),
                };
                SourceOutcome {
                    name,
                    result,
                    elapsed: t0.elapsed(),
                }
            });
        }

        let mut elapsed_ms = serde_json::Map::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(o) => o,
                Err(e) => {
                    // Wrapper tasks never panic; only runtime shutdown lands here.
                    warn!(target: "radar", error = %e, "source task aborted");
                    continue;
                }
            };
            pending.remove(&outcome.name);
            let ms = outcome.elapsed.as_secs_f64() * 1_000.0;
            histogram!("radar_fetch_ms").record(ms);
            elapsed_ms.insert(outcome.name.clone(), serde_json::json!(ms.round() as u64));

            match outcome.result {
                Ok(items) => {
                    info!(
                        target: "radar",
                        source = %outcome.name,
                        "[{}] {} items  ({:.1}s)",
                        outcome.name.to_uppercase(),
                        items.len(),
                        outcome.elapsed.as_secs_f64()
                    );
                    counter!("radar_items_total").increment(items.len() as u64);
                    results.add(outcome.name, items);
                }
                Err(err) => {
                    warn!(
                        target: "radar",
                        source = %outcome.name,
                        error = %err,
                        "[{}] ERROR — {}",
                        outcome.name.to_uppercase(),
                        err
                    );
                    counter!("radar_source_errors_total").increment(1);
                    results.add_error(outcome.name, err.to_string());
                }
            }
        }

        record_unreported(&mut results, pending);

        let run_ms = started.elapsed().as_millis() as u64;
        let error_ratio = results.error_ratio();
        results
            .meta
            .insert("elapsed_ms".into(), serde_json::Value::Object(elapsed_ms));
        results
            .meta
            .insert("run_elapsed_ms".into(), serde_json::json!(run_ms));
        results
            .meta
            .insert("error_ratio".into(), serde_json::json!(error_ratio));
        gauge!("radar_last_run_ts").set(Utc::now().timestamp() as f64);

        info!(
            target: "radar",
            total = results.total(),
            failed = results.errors().len(),
            "Total: {} trending items across {} sources",
            results.total(),
            results.items().len()
        );
        results
    }
}

/// Sources whose task vanished without an outcome still get an error entry.
fn record_unreported(results: &mut ResultSet, pending: BTreeSet<String>) {
    for name in pending {
        let err = SourceError::Fetch("source task aborted before reporting".into());
        warn!(target: "radar", source = %name, "[{}] ERROR — {}", name.to_uppercase(), err);
        counter!("radar_source_errors_total").increment(1);
        results.add_error(name, err.to_string());
    }
}

/// fetch → filter → score for one source. Filter runs first so the scorer's
/// batch maxima only see surviving records.
async fn process_source(
    source: Arc<dyn TrendSource>,
    ctx: FetchContext,
    filter: ContentFilter,
    scorer: TrendScorer,
    run_at: DateTime<Utc>,
) -> Result<Vec<TrendItem>, SourceError> {
    let fetched = match ctx.deadline {
        Some(deadline) => {
            let t0 = Instant::now();
            tokio::time::timeout_at(deadline, source.fetch(&ctx))
                .await
                .map_err(|_| SourceError::DeadlineExceeded(t0.elapsed().as_millis()))??
        }
        None => source.fetch(&ctx).await?,
    };

    let before = fetched.len();
    let kept = filter.apply(fetched);
    let dropped = before - kept.len();
    if dropped > 0 {
        debug!(target: "radar", source = source.name(), dropped, "filtered records");
        counter!("radar_filtered_total").increment(dropped as u64);
    }

    Ok(scorer.score_all(kept, run_at))
}
