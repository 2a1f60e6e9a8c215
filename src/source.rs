// src/source.rs
//! Source adapter contract and the name → factory registry.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::{RadarConfig, SourceSettings};
use crate::error::SourceError;
use crate::record::TrendItem;

/// Per-call context handed to adapters.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub settings: SourceSettings,
    /// Run-wide deadline, if the caller has one.
    pub deadline: Option<Instant>,
}

impl FetchContext {
    pub fn max_items(&self) -> usize {
        self.settings.max_items
    }
}

/// One platform. Implementations keep all payload-specific parsing to
/// themselves and hand back canonical records, de-duplicated by id and
/// capped at `ctx.max_items()`.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError>;
    fn name(&self) -> &str;
}

pub type SourceFactory = Arc<dyn Fn(&RadarConfig) -> Arc<dyn TrendSource> + Send + Sync>;

/// Name → factory. Adding a platform means registering another factory.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in platform adapters.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(crate::sources::tiktok::SOURCE_NAME, |cfg| {
            Arc::new(crate::sources::tiktok::TikTokSource::from_settings(
                &cfg.source(crate::sources::tiktok::SOURCE_NAME),
            ))
        });
        reg.register(crate::sources::instagram::SOURCE_NAME, |cfg| {
            Arc::new(crate::sources::instagram::InstagramSource::from_settings(
                &cfg.source(crate::sources::instagram::SOURCE_NAME),
            ))
        });
        reg
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&RadarConfig) -> Arc<dyn TrendSource> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn build(&self, name: &str, cfg: &RadarConfig) -> Option<Arc<dyn TrendSource>> {
        self.factories.get(name).map(|f| f(cfg))
    }
}

/// First occurrence of each id wins; result capped at `max`.
pub fn dedup_by_id(items: Vec<TrendItem>, max: usize) -> Vec<TrendItem> {
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|it| seen.insert(it.id.clone()))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_and_caps() {
        let items = vec![
            TrendItem::new("a", "x", "first a"),
            TrendItem::new("b", "x", "b"),
            TrendItem::new("a", "x", "second a"),
            TrendItem::new("c", "x", "c"),
        ];
        let out = dedup_by_id(items, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "first a");
        assert_eq!(out[1].id, "b");
    }

    #[test]
    fn builtin_registry_knows_platforms() {
        let reg = SourceRegistry::with_builtin();
        assert_eq!(reg.names(), vec!["instagram".to_string(), "tiktok".to_string()]);
        let src = reg.build("tiktok", &RadarConfig::default()).unwrap();
        assert_eq!(src.name(), "tiktok");
        assert!(reg.build("myspace", &RadarConfig::default()).is_none());
    }
}
