// src/notify/telegram.rs
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Notifier;
use crate::error::NotifyError;
use crate::record::truncate_chars;
use crate::results::ResultSet;

const TELEGRAM_MAX_CHARS: usize = 4096;

pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            api_base: "https://api.telegram.org".to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Point at a different Bot API host (self-hosted server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, digest: &str, _results: &ResultSet) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": truncate_chars(digest, TELEGRAM_MAX_CHARS),
            "disable_web_page_preview": true,
        });

        let rsp = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;
        if !rsp.status().is_success() {
            return Err(NotifyError::Status {
                channel: "telegram",
                status: rsp.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_is_always_set() {
        let n = TelegramNotifier::new("tok".into(), "42".into());
        assert_eq!(n.timeout, Duration::from_secs(10));
        let n = n.with_timeout(3).with_api_base("http://127.0.0.1:9");
        assert_eq!(n.timeout, Duration::from_secs(3));
        assert_eq!(n.api_base, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn unreachable_api_is_an_http_error() {
        let n = TelegramNotifier::new("tok".into(), "42".into())
            .with_api_base("http://127.0.0.1:9")
            .with_timeout(2);
        let err = n.send("digest", &ResultSet::default()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }
}
