pub mod api;
pub mod channels;
pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod scraping;
pub mod supervisor;

use std::sync::Arc;

use crate::config::{AppConfig, ConfigStore};
use crate::orchestrator::BotState;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ConfigStore>,
    pub bot: Arc<BotState>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
