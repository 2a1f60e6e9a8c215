// src/sources/instagram.rs
//! Instagram adapter. Understands two recorded payload shapes:
//! the explore grid (`sectional_items[].layout_content.medias[].media`) and
//! the public hashtag page (`graphql.hashtag.edge_hashtag_to_media.edges[].node`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{unix_to_utc, value_string, value_u64, PayloadMode};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::record::{extract_hashtags, make_id, normalize_text, truncate_chars, TrendItem};
use crate::source::{dedup_by_id, FetchContext, TrendSource};

pub const SOURCE_NAME: &str = "instagram";

/// Views are not exposed for photos; estimate them from likes.
const VIEWS_PER_LIKE: u64 = 8;

pub struct InstagramSource {
    mode: PayloadMode,
}

impl InstagramSource {
    pub fn from_settings(s: &SourceSettings) -> Self {
        Self {
            mode: PayloadMode::from_settings(s),
        }
    }

    pub fn from_fixture(payload: &str) -> Self {
        Self {
            mode: PayloadMode::Inline(payload.to_string()),
        }
    }

    pub fn parse_payload(payload: &str, fetched_at: DateTime<Utc>) -> Result<Vec<TrendItem>, SourceError> {
        let doc: Value = serde_json::from_str(payload)?;

        if let Some(sections) = doc.get("sectional_items").and_then(Value::as_array) {
            let medias = sections
                .iter()
                .filter_map(|s| s.pointer("/layout_content/medias").and_then(Value::as_array))
                .flatten()
                .filter_map(|m| m.get("media"));
            return Ok(medias.filter_map(|m| parse_media(m, fetched_at)).collect());
        }

        if let Some(hashtag) = doc.pointer("/graphql/hashtag") {
            let category = hashtag
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("trending");
            let edges = hashtag
                .pointer("/edge_hashtag_to_media/edges")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            return Ok(edges
                .iter()
                .filter_map(|e| e.get("node"))
                .filter_map(|n| parse_node(n, category, fetched_at))
                .collect());
        }

        Err(SourceError::Parse(
            "unrecognized instagram payload shape".to_string(),
        ))
    }

    fn sample(fetched_at: DateTime<Utc>) -> Vec<TrendItem> {
        const SAMPLE: &[(&str, u64, u64, u64, &[&str], &str)] = &[
            ("The aesthetic apartment tour everyone is reposting right now", 892_000, 12_000, 7_100_000, &["aesthetic", "apartment", "homedecor"], "lifestyle"),
            ("New restaurant just opened and the food looks absolutely insane", 445_000, 8_900, 3_600_000, &["food", "restaurant", "foodie"], "food"),
            ("Fitness transformation that has the whole internet inspired", 1_200_000, 23_000, 9_800_000, &["fitness", "transformation", "gym"], "fitness"),
            ("This travel destination just went viral and now everyone wants to go", 678_000, 15_000, 5_400_000, &["travel", "viral", "wanderlust"], "travel"),
            ("Celebrity couple spotted together and the internet is losing its mind", 2_300_000, 67_000, 18_700_000, &["celebrity", "trending", "entertainment"], "entertainment"),
            ("Skincare routine that actually works according to dermatologists", 567_000, 9_800, 4_500_000, &["skincare", "beauty", "wellness"], "beauty"),
        ];
        SAMPLE
            .iter()
            .enumerate()
            .map(|(i, (title, likes, comments, views, tags, cat))| {
                let mut it = TrendItem::new(make_id(SOURCE_NAME, &format!("sample-{i}")), SOURCE_NAME, *title);
                it.description = title.to_string();
                it.url = "https://www.instagram.com/explore".to_string();
                it.author = format!("@influencer{}", i + 1);
                it.hashtags = tags.iter().map(|t| t.to_string()).collect();
                it.likes = *likes;
                it.comments = *comments;
                it.views = *views;
                it.category = cat.to_string();
                it.fetched_at = fetched_at;
                it
            })
            .collect()
    }
}

/// Caption is either `{"text": ...}` or a bare string.
fn media_caption(media: &Value) -> String {
    match media.get("caption") {
        Some(Value::String(s)) => s.clone(),
        Some(obj @ Value::Object(_)) => obj
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// First line of the caption, at most 120 chars.
fn caption_title(caption: &str) -> String {
    truncate_chars(caption.lines().next().unwrap_or_default().trim(), 120)
}

fn parse_media(media: &Value, fetched_at: DateTime<Utc>) -> Option<TrendItem> {
    let caption = media_caption(media);
    if caption.trim().is_empty() {
        return None;
    }
    let key = media
        .get("pk")
        .and_then(value_string)
        .unwrap_or_else(|| truncate_chars(&caption, 20));
    let likes = media.get("like_count").map(value_u64).unwrap_or(0);
    let views = media
        .get("view_count")
        .map(value_u64)
        .unwrap_or_else(|| likes.saturating_mul(VIEWS_PER_LIKE));
    let code = media.get("code").and_then(Value::as_str).unwrap_or_default();
    let username = media
        .pointer("/user/username")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut it = TrendItem::new(make_id(SOURCE_NAME, &key), SOURCE_NAME, caption_title(&caption));
    it.description = normalize_text(&truncate_chars(&caption, 300));
    it.hashtags = extract_hashtags(&caption);
    it.url = format!("https://www.instagram.com/p/{code}");
    it.thumbnail = media
        .pointer("/image_versions2/candidates/0/url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    it.author = format!("@{username}");
    it.likes = likes;
    it.comments = media.get("comment_count").map(value_u64).unwrap_or(0);
    it.views = views;
    it.category = "explore".to_string();
    it.fetched_at = fetched_at;
    it.published_at = media.get("taken_at").map(value_u64).and_then(unix_to_utc);
    it.raw = media.clone();
    Some(it)
}

fn parse_node(node: &Value, category: &str, fetched_at: DateTime<Utc>) -> Option<TrendItem> {
    let caption = node
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if caption.trim().is_empty() {
        return None;
    }
    let key = node
        .get("id")
        .and_then(value_string)
        .unwrap_or_else(|| truncate_chars(caption, 20));
    let likes = node
        .pointer("/edge_liked_by/count")
        .map(value_u64)
        .unwrap_or(0);
    let shortcode = node.get("shortcode").and_then(Value::as_str).unwrap_or_default();
    let thumbnail = node
        .get("thumbnail_src")
        .or_else(|| node.get("display_url"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut it = TrendItem::new(make_id(SOURCE_NAME, &key), SOURCE_NAME, caption_title(caption));
    it.description = normalize_text(&truncate_chars(caption, 300));
    it.hashtags = extract_hashtags(caption);
    it.url = format!("https://www.instagram.com/p/{shortcode}");
    it.thumbnail = thumbnail.to_string();
    it.likes = likes;
    it.comments = node
        .pointer("/edge_media_to_comment/count")
        .map(value_u64)
        .unwrap_or(0);
    it.views = node
        .get("video_view_count")
        .map(value_u64)
        .unwrap_or_else(|| likes.saturating_mul(VIEWS_PER_LIKE));
    it.category = category.to_string();
    it.fetched_at = fetched_at;
    it.published_at = node
        .get("taken_at_timestamp")
        .map(value_u64)
        .and_then(unix_to_utc);
    it.raw = node.clone();
    Some(it)
}

#[async_trait]
impl TrendSource for InstagramSource {
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<TrendItem>, SourceError> {
        let now = Utc::now();
        let items = match self.mode.load().await? {
            Some(payload) => Self::parse_payload(&payload, now)?,
            None => Self::sample(now),
        };
        Ok(dedup_by_id(items, ctx.max_items()))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
