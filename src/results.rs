// src/results.rs
//! # Result Set
//! Outcome of one aggregation run: per-source successes, per-source errors,
//! and free-form annotations. A source key lives in exactly one of
//! `items`/`errors` once attempted.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::record::TrendItem;

#[derive(Debug, Clone)]
pub struct ResultSet {
    pub fetched_at: DateTime<Utc>,
    items: BTreeMap<String, Vec<TrendItem>>,
    errors: BTreeMap<String, String>,
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ResultSet {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            items: BTreeMap::new(),
            errors: BTreeMap::new(),
            meta: serde_json::Map::new(),
        }
    }

    /// Store a source's records (adapter order is kept as given).
    pub fn add(&mut self, source: impl Into<String>, items: Vec<TrendItem>) {
        let source = source.into();
        self.errors.remove(&source);
        self.items.insert(source, items);
    }

    pub fn add_error(&mut self, source: impl Into<String>, error: impl Into<String>) {
        let source = source.into();
        self.items.remove(&source);
        self.errors.insert(source, error.into());
    }

    pub fn items(&self) -> &BTreeMap<String, Vec<TrendItem>> {
        &self.items
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn items_for(&self, source: &str) -> Option<&[TrendItem]> {
        self.items.get(source).map(Vec::as_slice)
    }

    pub fn error_for(&self, source: &str) -> Option<&str> {
        self.errors.get(source).map(String::as_str)
    }

    /// Total number of records across successful sources.
    pub fn total(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// Number of sources that succeeded or failed (skipped ones excluded).
    pub fn attempted(&self) -> usize {
        self.items.len() + self.errors.len()
    }

    /// Share of attempted sources that failed; 0.0 when nothing was attempted.
    pub fn error_ratio(&self) -> f64 {
        match self.attempted() {
            0 => 0.0,
            n => self.errors.len() as f64 / n as f64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }

    /// All records across sources, best first.
    pub fn ranked(&self) -> Vec<&TrendItem> {
        let mut all: Vec<&TrendItem> = self.items.values().flatten().collect();
        all.sort_by(|a, b| rank_order(a, b));
        all
    }
}

/// Score desc, then engagement desc, then id and source asc.
pub fn rank_order(a: &TrendItem, b: &TrendItem) -> Ordering {
    b.trend_score
        .total_cmp(&a.trend_score)
        .then_with(|| b.engagement().cmp(&a.engagement()))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.source.cmp(&b.source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, source: &str, score: f64, views: u64) -> TrendItem {
        let mut it = TrendItem::new(id, source, id);
        it.trend_score = score;
        it.views = views;
        it
    }

    #[test]
    fn source_lives_in_one_map_only() {
        let mut rs = ResultSet::default();
        rs.add_error("tiktok", "boom");
        rs.add("tiktok", vec![item("a", "tiktok", 1.0, 1)]);
        assert!(rs.error_for("tiktok").is_none());
        assert_eq!(rs.total(), 1);

        rs.add_error("tiktok", "boom again");
        assert!(rs.items_for("tiktok").is_none());
        assert_eq!(rs.attempted(), 1);
        assert_eq!(rs.total(), 0);
    }

    #[test]
    fn ranked_breaks_ties_by_engagement_then_id() {
        let mut rs = ResultSet::default();
        rs.add(
            "tiktok",
            vec![
                item("b", "tiktok", 50.0, 10),
                item("a", "tiktok", 50.0, 10),
                item("c", "tiktok", 50.0, 99),
            ],
        );
        rs.add("instagram", vec![item("z", "instagram", 80.0, 0)]);

        let ids: Vec<&str> = rs.ranked().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "c", "a", "b"]);
    }

    #[test]
    fn error_ratio_over_attempted() {
        let mut rs = ResultSet::default();
        assert_eq!(rs.error_ratio(), 0.0);
        rs.add("a", vec![]);
        rs.add_error("b", "x");
        assert!((rs.error_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
