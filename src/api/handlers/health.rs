use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// GET /health — liveness plus a coarse staleness verdict. A paused bot is
/// healthy; a running bot that has not sent anything inside the health
/// threshold is not.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let running = state.store.is_running();
    let stale = running && state.bot.is_send_stale(state.config.health_stale_secs);

    if stale {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "reason": "no sends within health threshold",
            })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "running": running,
            })),
        )
    }
}
