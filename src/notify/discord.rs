// src/notify/discord.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::error::NotifyError;
use crate::record::truncate_chars;
use crate::results::ResultSet;

/// Discord rejects message content longer than this.
const DISCORD_MAX_CHARS: usize = 2000;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

/// 500ms, 1s, 2s, ... capped at 32s.
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << attempt.saturating_sub(1).min(6))
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: String,
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, digest: &str, _results: &ResultSet) -> Result<(), NotifyError> {
        let payload = DiscordWebhookPayload {
            content: truncate_chars(digest, DISCORD_MAX_CHARS),
        };

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) if rsp.status().is_success() => return Ok(()),
                Ok(rsp) => NotifyError::Status {
                    channel: "discord",
                    status: rsp.status().as_u16(),
                },
                Err(e) => NotifyError::Http(e),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(attempt, error = %err, "discord webhook retry");
            tokio::time::sleep(backoff(attempt)).await;
        }
    }
}
