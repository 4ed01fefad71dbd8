use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::atomic::Ordering;

use crate::models::RotationMode;
use crate::AppState;

/// A scheduler tick lands every ~500ms; missing this window means the
/// loop task is gone or wedged.
const SCHEDULER_ALIVE_WINDOW_SECS: u64 = 10;

/// POST /api/control/stop — pause distribution. The scheduler and
/// supervisor keep running; their firings are swallowed while paused.
pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.store.set_running(false);
    tracing::warn!("Distribution PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

/// POST /api/control/resume — resume distribution from a warm start:
/// dedup state and failure counters reset, next cycle runs FAVORITES.
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.bot.reset_for_resume().await;
    state.store.set_rotation(RotationMode::Favorites);
    state.store.set_running(true);
    tracing::info!("Distribution RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

/// GET /api/control/status — current system status.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let bot = &state.bot;
    let runtime = state.store.snapshot();

    let uptime_secs = (chrono::Utc::now() - bot.started_at).num_seconds().max(0);
    let last_send = bot.last_send().map(|t| t.to_rfc3339());

    Json(json!({
        "running": runtime.bot_running,
        "rotation": runtime.current_rotation.as_str(),
        "category": state.config.main_category.as_str(),
        "scheduler_alive": bot.scheduler_alive(SCHEDULER_ALIVE_WINDOW_SECS),
        "processing": bot.processing.load(Ordering::SeqCst),
        "recovering": bot.recovering.load(Ordering::SeqCst),
        "recovery_attempts": bot.recovery_attempts.load(Ordering::SeqCst),
        "consecutive_empty_random": bot.consecutive_empty_random.load(Ordering::SeqCst),
        "last_send": last_send,
        "uptime_secs": uptime_secs,
    }))
}
