use std::time::Duration;

use serde_json::json;

use super::MessageChannel;
use crate::models::ChannelKind;

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram Bot API client. Delivery failures are logged and reported as
/// `Ok(false)`; they never block the cycle.
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    http: reqwest::Client,
    bot_token: String,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    async fn post(&self, method: &str, body: serde_json::Value) -> anyhow::Result<bool> {
        let resp = self
            .http
            .post(self.api_url(method))
            .timeout(API_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::warn!(
                method,
                status = %resp.status(),
                "Telegram API returned non-2xx"
            );
            return Ok(false);
        }
        Ok(true)
    }
}

impl MessageChannel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn is_ready(&self) -> bool {
        match self
            .http
            .get(self.api_url("getMe"))
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Telegram getMe probe failed");
                false
            }
        }
    }

    async fn send(&self, destination: &str, text: &str, image: Option<&str>) -> anyhow::Result<bool> {
        let sent = match image {
            // Photo with the message as caption; if the photo is rejected
            // (dead URL, caption too long) fall back to plain text so the
            // signal still goes out.
            Some(photo) if text.len() <= 1024 => {
                let ok = self
                    .post(
                        "sendPhoto",
                        json!({
                            "chat_id": destination,
                            "photo": photo,
                            "caption": text,
                            "parse_mode": "HTML",
                        }),
                    )
                    .await
                    .unwrap_or(false);
                if ok {
                    true
                } else {
                    self.send_text(destination, text).await?
                }
            }
            _ => self.send_text(destination, text).await?,
        };

        if !sent {
            tracing::warn!(chat_id = %destination, "Telegram delivery failed");
        }
        Ok(sent)
    }
}

impl TelegramChannel {
    async fn send_text(&self, destination: &str, text: &str) -> anyhow::Result<bool> {
        match self
            .post(
                "sendMessage",
                json!({
                    "chat_id": destination,
                    "text": text,
                    "parse_mode": "HTML",
                }),
            )
            .await
        {
            Ok(sent) => Ok(sent),
            Err(e) => {
                // Transport errors are ordinary delivery failures here.
                tracing::warn!(error = %e, chat_id = %destination, "Telegram sendMessage failed");
                Ok(false)
            }
        }
    }
}
