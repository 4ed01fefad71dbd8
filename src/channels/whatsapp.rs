use std::time::Duration;

use serde_json::json;

use super::MessageChannel;
use crate::models::ChannelKind;

const API_TIMEOUT: Duration = Duration::from_secs(60);

/// WhatsApp client talking to a session gateway (the sidecar that owns the
/// actual WhatsApp Web session) over its REST API.
#[derive(Debug, Clone)]
pub struct WhatsAppChannel {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl WhatsAppChannel {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

impl MessageChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn is_ready(&self) -> bool {
        let req = self
            .http
            .get(format!("{}/status", self.base_url))
            .timeout(Duration::from_secs(10));

        match self.authorize(req).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<serde_json::Value>().await {
                    Ok(body) => body["connected"].as_bool().unwrap_or(false),
                    Err(_) => false,
                }
            }
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "WhatsApp gateway status probe non-2xx");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "WhatsApp gateway unreachable");
                false
            }
        }
    }

    async fn send(&self, destination: &str, text: &str, image: Option<&str>) -> anyhow::Result<bool> {
        let req = self
            .http
            .post(format!("{}/send", self.base_url))
            .timeout(API_TIMEOUT)
            .json(&json!({
                "groupId": destination,
                "message": text,
                "imageUrl": image,
            }));

        match self.authorize(req).send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                tracing::warn!(
                    group_id = %destination,
                    status = %resp.status(),
                    "WhatsApp gateway rejected send"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, group_id = %destination, "WhatsApp send failed");
                Ok(false)
            }
        }
    }
}
