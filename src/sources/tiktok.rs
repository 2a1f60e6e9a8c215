// src/sources/tiktok.rs
//! TikTok adapter over recorded explore/search payloads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use super::{lenient_opt_string, lenient_u64, unix_to_utc, PayloadMode};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::record::{extract_hashtags, make_id, normalize_text, truncate_chars, TrendItem};
use crate::source::{dedup_by_id, FetchContext, TrendSource};

pub const SOURCE_NAME: &str = "tiktok";

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(rename = "itemList", alias = "item_list", default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    id: Option<String>,
    #[serde(default)]
    desc: String,
    #[serde(rename = "createTime", default, deserialize_with = "lenient_u64")]
    create_time: u64,
    #[serde(default)]
    video: Video,
    #[serde(default)]
    author: Author,
    #[serde(default)]
    stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
struct Video {
    #[serde(default)]
    cover: String,
}

#[derive(Debug, Default, Deserialize)]
struct Author {
    #[serde(rename = "uniqueId", default)]
    unique_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Stats {
    #[serde(rename = "playCount", default, deserialize_with = "lenient_u64")]
    play_count: u64,
    #[serde(rename = "diggCount", default, deserialize_with = "lenient_u64")]
    digg_count: u64,
    #[serde(rename = "commentCount", default, deserialize_with = "lenient_u64")]
    comment_count: u64,
    #[serde(rename = "shareCount", default, deserialize_with = "lenient_u64")]
    share_count: u64,
}

pub struct TikTokSource {
    mode: PayloadMode,
    category: String,
}

impl TikTokSource {
    pub fn from_settings(s: &SourceSettings) -> Self {
        Self {
            mode: PayloadMode::from_settings(s),
            category: s
                .categories
                .first()
                .cloned()
                .unwrap_or_else(|| "trending".to_string()),
        }
    }

    pub fn from_fixture(payload: &str) -> Self {
        Self {
            mode: PayloadMode::Inline(payload.to_string()),
            category: "trending".to_string(),
        }
    }

    /// Parse an `itemList` payload. Posts without a caption or with a
    /// broken shape are skipped.
    pub fn parse_payload(
        payload: &str,
        category: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<TrendItem>, SourceError> {
        let list: ItemList = serde_json::from_str(payload)?;
        let mut out = Vec::with_capacity(list.items.len());
        for raw in list.items {
            let post: Post = match serde_json::from_value(raw.clone()) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(source = SOURCE_NAME, error = %e, "skipping malformed post");
                    counter!("radar_malformed_records_total").increment(1);
                    continue;
                }
            };
            if let Some(item) = Self::to_item(post, raw, category, fetched_at) {
                out.push(item);
            }
        }
        Ok(out)
    }

    fn to_item(
        post: Post,
        raw: serde_json::Value,
        category: &str,
        fetched_at: DateTime<Utc>,
    ) -> Option<TrendItem> {
        let desc = normalize_text(&post.desc);
        if desc.is_empty() {
            return None;
        }
        let post_id = post.id.unwrap_or_default();
        let key = if post_id.is_empty() {
            truncate_chars(&desc, 20)
        } else {
            post_id.clone()
        };
        let handle = if post.author.unique_id.is_empty() {
            "unknown".to_string()
        } else {
            post.author.unique_id
        };

        let mut it = TrendItem::new(make_id(SOURCE_NAME, &key), SOURCE_NAME, truncate_chars(&desc, 120));
        it.hashtags = extract_hashtags(&desc);
        it.url = format!("https://www.tiktok.com/@{handle}/video/{post_id}");
        it.thumbnail = post.video.cover;
        it.author = format!("@{handle}");
        it.description = desc;
        it.views = post.stats.play_count;
        it.likes = post.stats.digg_count;
        it.comments = post.stats.comment_count;
        it.shares = post.stats.share_count;
        it.category = category.to_string();
        it.fetched_at = fetched_at;
        it.published_at = unix_to_utc(post.create_time);
        it.raw = raw;
        Some(it)
    }

    fn sample(fetched_at: DateTime<Utc>) -> Vec<TrendItem> {
        const SAMPLE: &[(&str, u64, u64, u64, u64, &[&str], &str)] = &[
            ("POV: AI is taking over creative jobs and no one is talking about it", 8_200_000, 1_200_000, 45_000, 89_000, &["ai", "tech", "fyp"], "technology"),
            ("This cooking hack just changed my life forever (seriously try this)", 5_600_000, 780_000, 23_000, 67_000, &["food", "cooking", "lifehack"], "food"),
            ("The most insane sports moment you will ever see in your lifetime", 12_000_000, 2_100_000, 89_000, 210_000, &["sports", "viral", "fyp"], "sports"),
            ("Why everyone is suddenly moving out of California explained", 4_300_000, 560_000, 67_000, 34_000, &["news", "california", "trending"], "news"),
            ("This new product just dropped and the internet cannot stop talking about it", 7_800_000, 990_000, 34_000, 78_000, &["viral", "product", "trending"], "entertainment"),
            ("Breaking: major announcement changes everything we thought we knew", 9_100_000, 1_400_000, 112_000, 190_000, &["breaking", "news", "fyp"], "news"),
            ("Trying the viral food trend everyone is obsessed with right now", 3_400_000, 430_000, 18_000, 29_000, &["foodtok", "viral", "trend"], "food"),
            ("This small business owner's story will restore your faith in humanity", 6_700_000, 1_100_000, 56_000, 145_000, &["smallbusiness", "heartwarming", "fyp"], "entertainment"),
        ];
        SAMPLE
            .iter()
            .enumerate()
            .map(|(i, (title, views, likes, comments, shares, tags, cat))| {
                let mut it = TrendItem::new(make_id(SOURCE_NAME, &format!("sample-{i}")), SOURCE_NAME, *title);
                it.description = title.to_string();
                it.url = "https://www.tiktok.com/trending".to_string();
                it.author = format!("@creator{}", i + 1);
                it.hashtags = tags.iter().map(|t| t.to_string()).collect();
                it.views = *views;
                it.likes = *likes;
                it.comments = *comments;
                it.shares = *shares;
                it.category = cat.to_string();
                it.fetched_at = fetched_at;
                it
            })
            .collect()
    }
}

#[async_trait]
impl TrendSource for TikTokSource {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        let now = Utc::now();
        let items = match self.mode.load().await? {
            Some(payload) => Self::parse_payload(&payload, &self.category, now)?,
            None => Self::sample(now),
        };
        Ok(dedup_by_id(items, ctx.max_items()))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
