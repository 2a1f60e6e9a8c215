// src/record.rs
//! # Canonical Record
//! The normalized unit of trending content. Every source adapter produces
//! `TrendItem`s; the scorer is the only stage allowed to touch `trend_score`.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One piece of trending content, normalized across platforms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendItem {
    /// Stable identity within a source; equal ids mean the same content.
    pub id: String,
    pub source: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail: String,
    pub author: String,
    pub hashtags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub category: String,
    pub region: String,
    pub language: String,
    pub fetched_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub trend_score: f64,
    /// Source payload kept for diagnostics only.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl TrendItem {
    pub fn new(id: impl Into<String>, source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            title: title.into(),
            description: String::new(),
            url: String::new(),
            thumbnail: String::new(),
            author: String::new(),
            hashtags: Vec::new(),
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            category: "general".to_string(),
            region: "US".to_string(),
            language: "en".to_string(),
            fetched_at: Utc::now(),
            published_at: None,
            trend_score: 0.0,
            raw: serde_json::Value::Null,
        }
    }

    /// Sum of all engagement counters. Always recomputed.
    pub fn engagement(&self) -> u64 {
        self.views
            .saturating_add(self.likes)
            .saturating_add(self.comments)
            .saturating_add(self.shares)
    }

    /// Flat, display-oriented view (no raw payload, rounded score).
    pub fn to_export(&self) -> TrendItemExport {
        TrendItemExport {
            id: self.id.clone(),
            source: self.source.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            thumbnail: self.thumbnail.clone(),
            author: self.author.clone(),
            hashtags: self.hashtags.clone(),
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            shares: self.shares,
            category: self.category.clone(),
            region: self.region.clone(),
            language: self.language.clone(),
            trend_score: (self.trend_score * 100.0).round() / 100.0,
            fetched_at: self.fetched_at.to_rfc3339(),
            published_at: self.published_at.map(|t| t.to_rfc3339()),
            engagement: self.engagement(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendItemExport {
    pub id: String,
    pub source: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub thumbnail: String,
    pub author: String,
    pub hashtags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub category: String,
    pub region: String,
    pub language: String,
    pub trend_score: f64,
    pub fetched_at: String,
    pub published_at: Option<String>,
    pub engagement: u64,
}

/// Stable content id: first 12 hex chars of sha256("{source}:{key}").
pub fn make_id(source: &str, key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// `#tag` words in order of appearance, without the leading `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    static RE_TAG: OnceCell<Regex> = OnceCell::new();
    let re = RE_TAG.get_or_init(|| Regex::new(r"#(\w+)").expect("static hashtag regex"));
    re.captures_iter(text).map(|c| c[1].to_string()).collect()
}

/// Normalize caption text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static ws regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Truncate to at most `max` chars, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
