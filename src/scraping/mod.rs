pub mod client;

pub use client::ScraperClient;

use std::future::Future;

use crate::models::{Category, RotationMode, Signal};

/// The browser-automation scraping collaborator.
///
/// FAVORITES mode passes the configured names so the collaborator can use
/// its search-driven fetch path; RANDOM mode fetches the full category
/// batch. `Ok(vec![])` means "zero matches" (normal); `Err` means the
/// collaborator itself failed (retryable).
pub trait SignalSource: Send + Sync + 'static {
    fn fetch_signals(
        &self,
        mode: RotationMode,
        category: Category,
        favorites: Option<&[String]>,
    ) -> impl Future<Output = anyhow::Result<Vec<Signal>>> + Send;

    fn is_browser_healthy(&self) -> impl Future<Output = bool> + Send;

    /// Tear down and rebuild the browser session (close, relaunch,
    /// re-navigate, re-accept onboarding prompts).
    fn reinitialize(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}
