//! Telegram Bot API channel. Message delivery via `sendMessage`, nothing
//! more; the monitor never reads from the chat.

use crate::api::Notifier;
use crate::{Config, Result};
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends notifications to a fixed chat through a Telegram bot.
///
/// When the token or the chat id is missing, the notifier degrades to a
/// no-op that logs what it would have sent; the monitor keeps running
/// either way.
pub struct TelegramNotifier {
    client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let credentials = match (config.telegram_bot_token(), config.telegram_chat_id()) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => {
                warn!("Telegram credentials not configured, notifications will only be logged");
                None
            }
        };
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()
                .context("Unable to build the Telegram HTTP client")?,
            credentials,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let Some((token, chat_id)) = &self.credentials else {
            debug!("dropping notification (Telegram unconfigured): {text}");
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Telegram sendMessage request failed")?;

        let result: ApiResponse = response
            .json()
            .await
            .context("Invalid Telegram response")?;
        if !result.ok {
            bail!(
                "Telegram rejected the message: {}",
                result.description.unwrap_or_default()
            );
        }

        debug!("notification delivered to chat {chat_id}");
        Ok(())
    }
}
