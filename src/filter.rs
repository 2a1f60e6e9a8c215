// src/filter.rs
//! Content filter: allow-lists, banned keywords and an engagement floor.
//! Stable (keeps input order) and fail-closed on empty fields.

use crate::config::{AllowList, FilterConfig};
use crate::record::TrendItem;

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    categories: AllowList,
    regions: AllowList,
    languages: AllowList,
    /// Lower-cased, non-empty.
    banned_keywords: Vec<String>,
    min_engagement: u64,
}

impl ContentFilter {
    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self {
            categories: cfg.categories.clone(),
            regions: cfg.regions.clone(),
            languages: cfg.languages.clone(),
            banned_keywords: cfg
                .banned_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            min_engagement: cfg.min_engagement,
        }
    }

    /// True iff the record passes every configured predicate.
    pub fn keeps(&self, item: &TrendItem) -> bool {
        self.categories.allows(&item.category)
            && self.regions.allows(&item.region)
            && self.languages.allows(&item.language)
            && !self.is_banned(item)
            && item.engagement() >= self.min_engagement
    }

    fn is_banned(&self, item: &TrendItem) -> bool {
        if self.banned_keywords.is_empty() {
            return false;
        }
        let haystack = format!("{} {}", item.title, item.description).to_lowercase();
        self.banned_keywords.iter().any(|k| haystack.contains(k))
    }

    pub fn apply(&self, items: Vec<TrendItem>) -> Vec<TrendItem> {
        items.into_iter().filter(|it| self.keeps(it)).collect()
    }
}
