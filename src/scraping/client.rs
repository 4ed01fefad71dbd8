use std::time::Duration;

use anyhow::Context;

use super::SignalSource;
use crate::models::{Category, RotationMode, Signal};

/// Backoff schedule for failed fetches, in seconds.
const RETRY_BACKOFF_SECS: [u64; 3] = [5, 10, 15];

/// HTTP adapter to the browser-automation sidecar that owns the headless
/// browser session and the site-specific DOM extraction.
#[derive(Debug, Clone)]
pub struct ScraperClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ScraperClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn fetch_once(
        &self,
        category: Category,
        favorites: Option<&[String]>,
    ) -> anyhow::Result<Vec<Signal>> {
        let mut req = self
            .http
            .get(format!("{}/signals", self.base_url))
            .timeout(self.timeout)
            .query(&[("category", category.as_str())]);

        if let Some(names) = favorites {
            req = req.query(&[("names", names.join(","))]);
        }

        let resp = req.send().await.context("scraper sidecar unreachable")?;
        let resp = resp
            .error_for_status()
            .context("scraper sidecar returned error status")?;

        resp.json::<Vec<Signal>>()
            .await
            .context("invalid signal payload from scraper sidecar")
    }
}

impl SignalSource for ScraperClient {
    async fn fetch_signals(
        &self,
        mode: RotationMode,
        category: Category,
        favorites: Option<&[String]>,
    ) -> anyhow::Result<Vec<Signal>> {
        for attempt in 0..=RETRY_BACKOFF_SECS.len() {
            match self.fetch_once(category, favorites).await {
                Ok(signals) => {
                    tracing::debug!(
                        mode = %mode,
                        category = %category,
                        count = signals.len(),
                        "Fetched signal batch"
                    );
                    return Ok(signals);
                }
                Err(e) if attempt < RETRY_BACKOFF_SECS.len() => {
                    let backoff = RETRY_BACKOFF_SECS[attempt];
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "Signal fetch failed, backing off {backoff}s"
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("fetch retry loop always returns")
    }

    async fn is_browser_healthy(&self) -> bool {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(10))
            .send()
            .await;

        match resp {
            Ok(resp) if resp.status().is_success() => match resp.json::<serde_json::Value>().await
            {
                Ok(body) => body["healthy"].as_bool().unwrap_or(false),
                Err(_) => false,
            },
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "Scraper health probe non-2xx");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Scraper health probe failed");
                false
            }
        }
    }

    async fn reinitialize(&self) -> anyhow::Result<()> {
        self.http
            .post(format!("{}/reinitialize", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .context("scraper sidecar unreachable")?
            .error_for_status()
            .context("scraper reinitialize failed")?;
        Ok(())
    }
}
