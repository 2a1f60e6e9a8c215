// tests/aggregator_isolation.rs
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use social_radar::config::RadarConfig;
use social_radar::error::SourceError;
use social_radar::source::{FetchContext, SourceRegistry, TrendSource};
use social_radar::{Aggregator, TrendItem};

struct StaticSource {
    name: &'static str,
    items: Vec<TrendItem>,
}

#[async_trait]
impl TrendSource for StaticSource {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        self.name
    }
}

struct FailingSource;

#[async_trait]
impl TrendSource for FailingSource {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        Err(SourceError::Fetch("HTTP 403 from upstream".into()))
    }
    fn name(&self) -> &str {
        "broken"
    }
}

struct PanickingSource;

#[async_trait]
impl TrendSource for PanickingSource {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        panic!("adapter bug");
    }
    fn name(&self) -> &str {
        "panicky"
    }
}

struct SlowSource;

#[async_trait]
impl TrendSource for SlowSource {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![])
    }
    fn name(&self) -> &str {
        "slow"
    }
}

fn item(id: &str, source: &str, views: u64) -> TrendItem {
    let mut it = TrendItem::new(id, source, format!("title {id}"));
    it.views = views;
    it
}

fn registry() -> SourceRegistry {
    let mut reg = SourceRegistry::new();
    reg.register("good", |_| {
        Arc::new(StaticSource {
            name: "good",
            items: vec![item("a", "good", 10), item("b", "good", 1000), item("c", "good", 0)],
        })
    });
    reg.register("broken", |_| Arc::new(FailingSource));
    reg.register("panicky", |_| Arc::new(PanickingSource));
    reg
}

#[tokio::test]
async fn failing_source_is_isolated() {
    let agg = Aggregator::new(Arc::new(RadarConfig::default()), registry());
    let rs = agg
        .run(Some(&["good".to_string(), "broken".to_string()]))
        .await;

    assert!(rs.items_for("good").is_some());
    assert!(rs.error_for("good").is_none());
    assert!(rs.items_for("broken").is_none());
    assert!(rs.error_for("broken").unwrap().contains("403"));
    assert_eq!(rs.total(), 3);
    assert_eq!(rs.attempted(), 2);
}

#[tokio::test]
async fn successful_items_are_scored_and_ordered() {
    let agg = Aggregator::new(Arc::new(RadarConfig::default()), registry());
    let rs = agg.run(Some(&["good".to_string()])).await;
    let items = rs.items_for("good").unwrap();
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert!(items.iter().all(|i| i.trend_score >= 0.0));
    assert!(items[0].trend_score > items[1].trend_score);
}

#[tokio::test]
async fn panicking_adapter_becomes_an_error_entry() {
    let agg = Aggregator::new(Arc::new(RadarConfig::default()), registry());
    let rs = agg.run_all().await;

    assert!(rs.error_for("panicky").unwrap().contains("panicked"));
    assert!(rs.error_for("broken").is_some());
    assert_eq!(rs.items_for("good").map(|v| v.len()), Some(3));
    assert!((rs.error_ratio() - 2.0 / 3.0).abs() < 1e-9);
    assert!(rs.meta.contains_key("run_elapsed_ms"));
    assert!(rs.meta["elapsed_ms"].get("good").is_some());
}

#[tokio::test]
async fn disabled_sources_are_skipped_silently() {
    let cfg = RadarConfig::from_toml_str("[sources.broken]\nenabled = false\n").unwrap();
    let agg = Aggregator::new(Arc::new(cfg), registry());
    let rs = agg
        .run(Some(&["good".to_string(), "broken".to_string()]))
        .await;

    assert!(rs.error_for("broken").is_none());
    assert!(rs.items_for("broken").is_none());
    assert_eq!(rs.attempted(), 1);
}

#[tokio::test]
async fn unknown_source_name_is_recorded_as_error() {
    let agg = Aggregator::new(Arc::new(RadarConfig::default()), registry());
    let rs = agg
        .run(Some(&["good".to_string(), "myspace".to_string()]))
        .await;
    assert!(rs.error_for("myspace").unwrap().contains("myspace"));
    assert_eq!(rs.total(), 3);
}

#[tokio::test]
async fn filter_runs_before_scoring() {
    let cfg = RadarConfig::from_toml_str(
        r#"
        [filters]
        min_engagement = 5

        [report.trending_score_weight]
        views = 1.0
        likes = 0.0
        comments = 0.0
        shares = 0.0
        recency = 0.0
        "#,
    )
    .unwrap();
    let mut reg = SourceRegistry::new();
    reg.register("good", |_| {
        Arc::new(StaticSource {
            name: "good",
            items: vec![item("small", "good", 10), item("tiny", "good", 1)],
        })
    });
    let agg = Aggregator::new(Arc::new(cfg), reg);
    let rs = agg.run_all().await;
    let items = rs.items_for("good").unwrap();
    assert_eq!(items.len(), 1);
    // batch max is computed after filtering, so the survivor is the max
    assert!((items[0].trend_score - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn run_deadline_is_enforced_per_source() {
    let cfg = RadarConfig::from_toml_str("[aggregator]\nrun_deadline_secs = 1\n").unwrap();
    let mut reg = registry();
    reg.register("slow", |_| Arc::new(SlowSource));
    let agg = Aggregator::new(Arc::new(cfg), reg);

    let rs = tokio::time::timeout(
        Duration::from_secs(10),
        agg.run(Some(&["good".to_string(), "slow".to_string()])),
    )
    .await
    .expect("run should finish once the deadline passes");

    assert!(rs.error_for("slow").unwrap().contains("deadline"));
    assert_eq!(rs.total(), 3);
}

#[tokio::test]
async fn empty_selection_runs_every_registered_source() {
    let agg = Aggregator::new(Arc::new(RadarConfig::default()), SourceRegistry::with_builtin());
    let rs = agg.run(Some(&[])).await;

    assert_eq!(rs.attempted(), 2);
    assert!(rs.items_for("tiktok").is_some());
    assert!(rs.items_for("instagram").is_some());
    assert!(rs.total() > 0);
}
