use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

use crate::config::TwilioConfig;

/// Proactive message delivery (reminders, daily greeting). Inbound replies
/// go back through the webhook response instead.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

pub struct TwilioSender {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioSender {
    pub fn new(config: TwilioConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build twilio http client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        self.http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.from_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await
            .context("twilio request")?
            .error_for_status()
            .context("twilio status")?;
        info!(%to, "outbound message sent");
        Ok(())
    }
}
