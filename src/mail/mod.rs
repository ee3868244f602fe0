//! Outbound email.
//!
//! Everything that needs to reach a user's inbox goes through [`Mailer`], so
//! flows that depend on delivery can be exercised without an SMTP server.

pub mod templates;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends an HTML message. `Err` means the message was not handed off.
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        // 465 is implicit TLS, everything else upgrades with STARTTLS
        let relay = if cfg.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
        };
        let builder = relay.with_context(|| format!("smtp relay {}", cfg.host))?;

        let transport = builder
            .port(cfg.port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(20)))
            .build();

        Ok(Self {
            transport,
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("build email")?;

        self.transport.send(email).await.context("smtp send")?;
        info!(to = %to, "email sent");
        Ok(())
    }
}

/// Used when SMTP is not configured: every send fails, so delivery-gated
/// flows refuse to proceed.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, to: &str, _subject: &str, _html_body: &str) -> anyhow::Result<()> {
        warn!(to = %to, "email requested but SMTP is not configured");
        anyhow::bail!("smtp is not configured")
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// Records outgoing mail; can be told to fail.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub fail: bool,
        pub sent: Mutex<Vec<SentMail>>,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub async fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("simulated smtp outage");
            }
            self.sent.lock().await.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: html_body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_mailer_always_fails() {
        let err = DisabledMailer
            .send("someone@example.com", "hi", "<p>hi</p>")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_bad_recipient_before_connecting() {
        let mailer = SmtpMailer::new(&SmtpConfig {
            host: "smtp.invalid".into(),
            port: 587,
            username: "mailer@example.com".into(),
            password: "pw".into(),
            from: "mailer@example.com".into(),
        })
        .expect("transport builds lazily");
        let err = mailer.send("not an address", "s", "b").await.unwrap_err();
        assert!(err.to_string().contains("invalid recipient"));
    }
}
