// src/notify/mod.rs
//! Digest formatting and fan-out to notification channels.
//!
//! The sender list is fixed when the `Dispatcher` is built; every sender is
//! tried independently and a failing channel never blocks the others.

pub mod discord;
pub mod email;
pub mod telegram;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::RadarConfig;
use crate::error::NotifyError;
use crate::record::truncate_chars;
use crate::results::ResultSet;

pub const DEFAULT_TOP_N: usize = 10;
pub const TITLE_MAX_CHARS: usize = 80;

const HEADER: &str = "🔥 **SocialRadar — Top Trending Now**";

/// One delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, digest: &str, results: &ResultSet) -> Result<(), NotifyError>;
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Top `top_n` records of the ranked view as a human-readable digest.
pub fn format_digest(results: &ResultSet, top_n: usize) -> String {
    let ranked = results.ranked();
    let mut lines = vec![HEADER.to_string(), String::new()];
    if ranked.is_empty() || top_n == 0 {
        lines.push("No trending items this run.".to_string());
    }
    for (i, item) in ranked.iter().take(top_n).enumerate() {
        lines.push(format!(
            "{}. [{}] {}",
            i + 1,
            item.source.to_uppercase(),
            truncate_chars(&item.title, TITLE_MAX_CHARS)
        ));
        lines.push(format!(
            "   👁 {}  ❤ {}  ⚡ {:.0}",
            group_thousands(item.views),
            group_thousands(item.likes),
            item.trend_score
        ));
        lines.push(format!("   {}", item.url));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Per-sender delivery outcome of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<(String, Result<(), String>)>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

pub struct Dispatcher {
    senders: Vec<Box<dyn Notifier>>,
    top_n: usize,
}

impl Dispatcher {
    pub fn new(senders: Vec<Box<dyn Notifier>>, top_n: usize) -> Self {
        Self { senders, top_n }
    }

    /// Resolve enabled channels once.
    pub fn from_config(cfg: &RadarConfig) -> Result<Self, NotifyError> {
        let ch = &cfg.notifications.channels;
        let mut senders: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(d) = ch.discord.as_ref().filter(|d| d.enabled) {
            senders.push(Box::new(discord::DiscordNotifier::new(d.webhook_url.clone())));
        }
        if let Some(t) = ch.telegram.as_ref().filter(|t| t.enabled) {
            senders.push(Box::new(telegram::TelegramNotifier::new(
                t.bot_token.clone(),
                t.chat_id.clone(),
            )));
        }
        if let Some(e) = ch.email.as_ref().filter(|e| e.enabled) {
            senders.push(Box::new(email::EmailSender::from_config(e)?));
        }
        Ok(Self::new(senders, cfg.report.top_n))
    }

    pub fn sender_names(&self) -> Vec<&str> {
        self.senders.iter().map(|s| s.name()).collect()
    }

    pub fn digest(&self, results: &ResultSet) -> String {
        format_digest(results, self.top_n)
    }

    pub async fn dispatch(&self, results: &ResultSet) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.senders.is_empty() {
            return report;
        }

        let message = self.digest(results);
        for sender in &self.senders {
            let outcome = sender.send(&message, results).await;
            match &outcome {
                Ok(()) => info!(target: "radar", channel = sender.name(), "Notification sent"),
                Err(e) => {
                    warn!(target: "radar", channel = sender.name(), error = %e, "Notification failed")
                }
            }
            report
                .outcomes
                .push((sender.name().to_string(), outcome.map_err(|e| e.to_string())));
        }
        report
    }
}
