use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use signalbot::api::router::create_router;
use signalbot::channels::{TelegramChannel, WhatsAppChannel};
use signalbot::config::{AppConfig, ConfigStore};
use signalbot::engine::{ChannelBinding, DispatchFanout};
use signalbot::orchestrator::{BotState, Orchestrator};
use signalbot::scraping::ScraperClient;
use signalbot::supervisor::Supervisor;
use signalbot::AppState;

const RESTART_DELAY_SECS: u64 = 30;
const RESTART_STRIKE_LIMIT: u32 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Installed once: the recorder is process-global and the service body
    // below may run more than once.
    let metrics_handle = signalbot::metrics::init_metrics();

    let mut consecutive_failures = 0u32;
    loop {
        match run(metrics_handle.clone()).await {
            Ok(()) => {
                tracing::info!("Shut down cleanly");
                return Ok(());
            }
            Err(e) => {
                consecutive_failures += 1;
                let delay = if consecutive_failures >= RESTART_STRIKE_LIMIT {
                    RESTART_DELAY_SECS * 2
                } else {
                    RESTART_DELAY_SECS
                };
                tracing::error!(
                    error = %e,
                    consecutive_failures,
                    retry_secs = delay,
                    "Service failed, restarting"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
        }
    }
}

/// One full service lifetime: bootstrap, background loops, API server.
/// Returns `Ok(())` only on a graceful shutdown signal.
async fn run(metrics_handle: PrometheusHandle) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let store = Arc::new(ConfigStore::load(config.config_file.clone()));
    let bot = Arc::new(BotState::new(config.sent_cache_limit));

    let source = ScraperClient::new(config.scraper_base_url.clone(), config.scraper_timeout_secs);

    let whatsapp = match &config.whatsapp_api_url {
        Some(url) => ChannelBinding::new(
            Some(WhatsAppChannel::new(
                url.clone(),
                config.whatsapp_api_token.clone(),
            )),
            config.whatsapp_group_ids.clone(),
        ),
        None => {
            tracing::warn!("WHATSAPP_API_URL not set, WhatsApp channel disabled");
            ChannelBinding::disabled()
        }
    };
    let telegram = match &config.telegram_bot_token {
        Some(token) => ChannelBinding::new(
            Some(TelegramChannel::new(token.clone())),
            config.telegram_chat_ids.clone(),
        ),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, Telegram channel disabled");
            ChannelBinding::disabled()
        }
    };
    if whatsapp.client.is_none() && telegram.client.is_none() {
        anyhow::bail!("no messaging channel configured");
    }

    let orchestrator = Arc::new(Orchestrator::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&bot),
        source,
        DispatchFanout::new(whatsapp, telegram),
    ));

    let supervisor = Supervisor::new(Arc::clone(&orchestrator));
    supervisor.spawn_scheduler();
    let supervisor_task = tokio::spawn(Arc::clone(&supervisor).run());

    tracing::info!(
        category = %config.main_category,
        "Signal bot started"
    );

    let state = AppState {
        config,
        store,
        bot,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    supervisor_task.abort();
    supervisor.shutdown();

    result.map_err(Into::into)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
