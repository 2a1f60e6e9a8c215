// src/notify/email.rs
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::EmailConfig;
use crate::error::NotifyError;
use crate::results::ResultSet;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    pub fn from_config(cfg: &EmailConfig) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map_err(|e| NotifyError::Config(format!("invalid smtp_host: {e}")))?;
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }

        let from = cfg
            .from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Config(format!("invalid from address: {e}")))?;
        let to = cfg
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Config(format!("invalid to address: {e}")))?;

        Ok(Self {
            mailer: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for EmailSender {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, digest: &str, results: &ResultSet) -> Result<(), NotifyError> {
        let subject = format!(
            "SocialRadar: {} trending items ({})",
            results.total(),
            results.fetched_at.format("%Y-%m-%d %H:%M UTC")
        );

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(digest.to_string())
            .map_err(|e| NotifyError::Email(format!("build email: {e}")))?;

        self.mailer
            .send(msg)
            .await
            .map_err(|e| NotifyError::Email(format!("send email: {e}")))?;
        Ok(())
    }
}
