use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::config::store::RuntimeConfig;
use crate::errors::AppError;
use crate::models::Category;
use crate::AppState;

/// GET /api/config — the current runtime settings, refreshed from disk.
pub async fn get_config(State(state): State<AppState>) -> Json<RuntimeConfig> {
    Json(state.store.snapshot())
}

/// Partial update; absent fields are left alone. Run-state and rotation
/// are deliberately excluded, those go through the control routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigRequest {
    pub site_name: Option<String>,
    pub affiliate_link: Option<String>,
    pub categories: Option<CategoryUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CategoryUpdate {
    pub pg: Option<bool>,
    pub pp: Option<bool>,
    pub wg: Option<bool>,
}

/// PUT /api/config — apply and persist runtime setting changes.
pub async fn update_config(
    State(state): State<AppState>,
    Json(body): Json<UpdateConfigRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.site_name.is_none() && body.affiliate_link.is_none() && body.categories.is_none() {
        return Err(AppError::BadRequest(
            "no recognized config fields provided".into(),
        ));
    }

    let store = &state.store;

    if let Some(name) = &body.site_name {
        store.set_site_name(name);
    }
    if let Some(link) = &body.affiliate_link {
        store.set_affiliate_link(link);
    }
    if let Some(categories) = &body.categories {
        for (category, enabled) in [
            (Category::Pg, categories.pg),
            (Category::Pp, categories.pp),
            (Category::Wg, categories.wg),
        ] {
            if let Some(enabled) = enabled {
                store.set_category_enabled(category, enabled);
            }
        }
    }

    tracing::info!("Runtime config updated via API");
    Ok(Json(json!({ "success": true, "config": store.snapshot() })))
}
