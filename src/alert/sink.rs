use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::alert::telegram::TelegramClient;
use crate::config::Config;
use crate::errors::NotifyError;

/// Best-effort delivery of one formatted message.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

pub struct StdoutSink;

#[async_trait]
impl Notifier for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        println!("{text}\n");
        Ok(())
    }
}

pub struct TelegramSink {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(token: &str, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            client: TelegramClient::new(token)?,
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.client.send_message(&self.chat_id, text).await?;
        info!(chat_id = %self.chat_id, "telegram message sent");
        Ok(())
    }
}

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .user_agent(concat!("liquidity-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn is_discord(&self) -> bool {
        self.url.contains("discord.com/api/webhooks")
            || self.url.contains("discordapp.com/api/webhooks")
    }
}

#[async_trait]
impl Notifier for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let body = if self.is_discord() {
            serde_json::json!({ "content": text })
        } else {
            serde_json::json!({ "text": text })
        };
        // webhook URLs carry their secret in the path
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            let preview: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(180)
                .collect();
            return Err(NotifyError::Rejected {
                sink: "webhook",
                status: status.as_u16(),
                body: preview,
            });
        }
        Ok(())
    }
}

/// Every sink the configuration enables, in delivery order.
pub fn build_notifiers(config: &Config) -> Result<Vec<Arc<dyn Notifier>>, NotifyError> {
    let mut sinks: Vec<Arc<dyn Notifier>> = Vec::new();
    if config.alerts.enable_stdout {
        sinks.push(Arc::new(StdoutSink));
    }
    if config.telegram_enabled() {
        sinks.push(Arc::new(TelegramSink::new(
            config.telegram.bot_token.trim(),
            config.telegram.chat_id.trim(),
        )?));
        info!("telegram notifications enabled");
    } else {
        info!("telegram notifications disabled (no credentials provided)");
    }
    if !config.alerts.discord_webhook.trim().is_empty() {
        sinks.push(Arc::new(WebhookSink::new(
            config.alerts.discord_webhook.trim(),
        )?));
    }
    Ok(sinks)
}
