// src/config.rs
//! Runtime configuration.
//!
//! Loaded once at startup from TOML or JSON; every section has defaults so an
//! empty file (or no file at all) is a valid configuration. The raw document
//! is kept for dotted-path lookups such as `report.trending_score_weight`.

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/radar.toml";
pub const DEFAULT_JSON_PATH: &str = "config/radar.json";

pub const DEFAULT_MAX_ITEMS: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub report: ReportConfig,
    pub schedule: ScheduleConfig,
    pub filters: FilterConfig,
    pub aggregator: AggregatorConfig,
    pub sources: BTreeMap<String, SourceSettings>,
    pub notifications: NotifyConfig,
    #[serde(skip)]
    raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
    pub trending_score_weight: ScoreWeights,
    pub recency_horizon_hours: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            trending_score_weight: ScoreWeights::default(),
            recency_horizon_hours: 48.0,
        }
    }
}

/// Per-signal weights. Unknown signal names are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub recency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            views: 0.35,
            likes: 0.25,
            comments: 0.15,
            shares: 0.15,
            recency: 0.10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Optional per-run deadline handed to every adapter.
    pub run_deadline_secs: Option<u64>,
}

/// Inclusion rules applied to every record of a batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub categories: AllowList,
    pub regions: AllowList,
    pub languages: AllowList,
    pub banned_keywords: Vec<String>,
    pub min_engagement: u64,
}

/// `"*"`, absent, or a list containing `"*"` means "anything goes".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowList {
    #[default]
    Any,
    /// Lower-cased allowed values.
    Only(BTreeSet<String>),
}

impl AllowList {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for v in values {
            let t = v.as_ref().trim();
            if t == "*" {
                return AllowList::Any;
            }
            if !t.is_empty() {
                set.insert(t.to_lowercase());
            }
        }
        AllowList::Only(set)
    }

    /// Case-insensitive membership; an empty value never matches a restricted list.
    pub fn allows(&self, value: &str) -> bool {
        match self {
            AllowList::Any => true,
            AllowList::Only(set) => {
                let v = value.trim();
                !v.is_empty() && set.contains(&v.to_lowercase())
            }
        }
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }
        Ok(match Repr::deserialize(d)? {
            Repr::One(s) => AllowList::only([s]),
            Repr::Many(v) => AllowList::only(v),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub enabled: bool,
    pub max_items: usize,
    /// Recorded platform payload to parse instead of the built-in sample.
    pub fixture: Option<PathBuf>,
    pub categories: Vec<String>,
    /// Replaces the global filter for this source only.
    pub filter: Option<FilterConfig>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_items: DEFAULT_MAX_ITEMS,
            fixture: None,
            categories: Vec::new(),
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub discord: Option<DiscordConfig>,
    pub telegram: Option<TelegramConfig>,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub enabled: bool,
    /// "ENV" reads DISCORD_WEBHOOK_URL.
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    /// "ENV" reads TELEGRAM_BOT_TOKEN.
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub username: String,
    /// "ENV" reads SMTP_PASS.
    pub password: String,
    pub from: String,
    pub to: String,
}

impl RadarConfig {
    /// Load from an explicit path. Format is picked from the extension,
    /// defaulting to TOML.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Env var + fallbacks:
    /// 1) $RADAR_CONFIG_PATH
    /// 2) config/radar.toml
    /// 3) config/radar.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::Invalid(format!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                )));
            }
            return Self::load_from(&pb);
        }
        for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        let cfg = Self::default();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let doc: toml::Value = toml::from_str(s)?;
        let raw = serde_json::to_value(&doc)?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let raw: serde_json::Value = serde_json::from_str(s)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: serde_json::Value) -> Result<Self, ConfigError> {
        let mut cfg: RadarConfig = serde_json::from_value(raw.clone())?;
        cfg.raw = raw;
        cfg.resolve_env_secrets()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Dotted-path lookup over the raw document, e.g. `schedule.interval_minutes`.
    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        path.split('.')
            .try_fold(&self.raw, |node, key| node.as_object()?.get(key))
    }

    pub fn is_enabled(&self, source: &str) -> bool {
        self.sources.get(source).map_or(true, |s| s.enabled)
    }

    pub fn source(&self, source: &str) -> SourceSettings {
        self.sources.get(source).cloned().unwrap_or_default()
    }

    /// Effective filter for a source: its override, else the global one.
    pub fn filter_for(&self, source: &str) -> &FilterConfig {
        self.sources
            .get(source)
            .and_then(|s| s.filter.as_ref())
            .unwrap_or(&self.filters)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "schedule.interval_minutes must be > 0".into(),
            ));
        }
        if !self.report.recency_horizon_hours.is_finite() {
            return Err(ConfigError::Invalid(
                "report.recency_horizon_hours must be finite".into(),
            ));
        }
        for (name, s) in &self.sources {
            if s.max_items == 0 {
                return Err(ConfigError::Invalid(format!(
                    "sources.{name}.max_items must be > 0"
                )));
            }
        }
        let ch = &self.notifications.channels;
        if let Some(d) = ch.discord.as_ref().filter(|d| d.enabled) {
            if d.webhook_url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notifications.channels.discord.webhook_url missing".into(),
                ));
            }
        }
        if let Some(t) = ch.telegram.as_ref().filter(|t| t.enabled) {
            if t.bot_token.trim().is_empty() || t.chat_id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "notifications.channels.telegram needs bot_token and chat_id".into(),
                ));
            }
        }
        if let Some(e) = ch.email.as_ref().filter(|e| e.enabled) {
            if e.smtp_host.trim().is_empty() || e.from.trim().is_empty() || e.to.trim().is_empty()
            {
                return Err(ConfigError::Invalid(
                    "notifications.channels.email needs smtp_host, from and to".into(),
                ));
            }
        }
        Ok(())
    }

    fn resolve_env_secrets(&mut self) -> Result<(), ConfigError> {
        let ch = &mut self.notifications.channels;
        if let Some(d) = ch.discord.as_mut().filter(|d| d.enabled) {
            resolve_env(&mut d.webhook_url, "DISCORD_WEBHOOK_URL")?;
        }
        if let Some(t) = ch.telegram.as_mut().filter(|t| t.enabled) {
            resolve_env(&mut t.bot_token, "TELEGRAM_BOT_TOKEN")?;
        }
        if let Some(e) = ch.email.as_mut().filter(|e| e.enabled) {
            resolve_env(&mut e.password, "SMTP_PASS")?;
        }
        Ok(())
    }
}

fn resolve_env(value: &mut String, var: &str) -> Result<(), ConfigError> {
    if value.trim().eq_ignore_ascii_case("env") {
        *value = std::env::var(var)
            .map_err(|_| ConfigError::Invalid(format!("missing {var} env var")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = RadarConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.schedule.interval_minutes, 60);
        assert!(cfg.schedule.run_on_start);
        assert_eq!(cfg.report.top_n, 10);
        assert_eq!(cfg.report.trending_score_weight, ScoreWeights::default());
        assert!(cfg.is_enabled("tiktok"));
        assert_eq!(cfg.source("tiktok").max_items, DEFAULT_MAX_ITEMS);
    }

    #[test]
    fn dotted_lookup_reads_nested_keys() {
        let cfg = RadarConfig::from_toml_str(
            r#"
            [report.trending_score_weight]
            views = 1.0
            likes = 0.0

            [sources.reddit]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.get("report.trending_score_weight.views"),
            Some(&serde_json::json!(1.0))
        );
        assert_eq!(cfg.get("sources.reddit.enabled"), Some(&serde_json::json!(false)));
        assert!(cfg.get("report.nope").is_none());
        assert!(!cfg.is_enabled("reddit"));
        assert!((cfg.report.trending_score_weight.comments - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn allow_lists_accept_star_and_lists() {
        let cfg = RadarConfig::from_json_str(
            r#"{"filters": {"categories": "*", "regions": ["US", "gb"], "languages": ["en", "*"]}}"#,
        )
        .unwrap();
        assert_eq!(cfg.filters.categories, AllowList::Any);
        assert_eq!(cfg.filters.languages, AllowList::Any);
        assert!(cfg.filters.regions.allows("us"));
        assert!(cfg.filters.regions.allows("GB"));
        assert!(!cfg.filters.regions.allows("DE"));
        assert!(!cfg.filters.regions.allows(""));
    }

    #[test]
    fn unknown_weight_name_is_rejected() {
        let err = RadarConfig::from_toml_str(
            r#"
            [report.trending_score_weight]
            virality = 1.0
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn zero_interval_fails_fast() {
        let err = RadarConfig::from_toml_str("[schedule]\ninterval_minutes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn enabled_discord_without_webhook_is_invalid() {
        let err = RadarConfig::from_toml_str(
            "[notifications.channels.discord]\nenabled = true\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("webhook_url"));
    }

    #[test]
    fn per_source_filter_overrides_global() {
        let cfg = RadarConfig::from_toml_str(
            r#"
            [filters]
            min_engagement = 10

            [sources.tiktok.filter]
            min_engagement = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.filter_for("tiktok").min_engagement, 500);
        assert_eq!(cfg.filter_for("instagram").min_engagement, 10);
    }

    #[serial_test::serial]
    #[test]
    fn env_secret_is_resolved() {
        env::set_var("DISCORD_WEBHOOK_URL", "https://discord.test/hook");
        let cfg = RadarConfig::from_toml_str(
            "[notifications.channels.discord]\nenabled = true\nwebhook_url = \"ENV\"\n",
        )
        .unwrap();
        env::remove_var("DISCORD_WEBHOOK_URL");
        let d = cfg.notifications.channels.discord.unwrap();
        assert_eq!(d.webhook_url, "https://discord.test/hook");
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg.schedule.interval_minutes, 60);

        let p = tmp.path().join("radar.json");
        fs::write(&p, r#"{"schedule": {"interval_minutes": 5}}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg.schedule.interval_minutes, 5);
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
