use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::CatalogPublisher;
use crate::config::TelegramConfig;
use crate::errors::ServiceError;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends catalog posts through the Telegram Bot API.
///
/// Every post goes to the supplier chat first and then to the public
/// channel. A chat with an empty id is skipped.
#[derive(Clone)]
pub struct TelegramPublisher {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramPublisher {
    pub fn new(config: TelegramConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("Unable to build HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), ServiceError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which contains the bot token
                ServiceError::ExternalServiceError(format!(
                    "Telegram request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalServiceError(format!(
                "Telegram returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogPublisher for TelegramPublisher {
    #[instrument(skip(self, text), fields(length = text.len()))]
    async fn publish(&self, text: &str) -> Result<(), ServiceError> {
        if !self.config.is_configured() {
            return Err(ServiceError::ExternalServiceError(
                "Telegram bot token is not configured".to_string(),
            ));
        }

        for chat_id in [&self.config.supplier_chat_id, &self.config.channel_chat_id] {
            if chat_id.trim().is_empty() {
                warn!("Telegram chat id not configured; skipping");
                continue;
            }
            self.send_message(chat_id, text).await?;
            info!(chat_id = %chat_id, "Catalog message sent");
        }

        Ok(())
    }
}
