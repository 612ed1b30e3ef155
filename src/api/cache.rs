//! Cache administration endpoint.

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::services::now_iso;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/clear", post(clear_cache))
}

/// Drop every cached aggregate so the next request refetches.
async fn clear_cache(State(state): State<AppState>) -> Json<ClearResponse> {
    let keys = state.cache.len();
    state.cache.clear();
    info!("Cache cleared ({} keys)", keys);

    Json(ClearResponse {
        success: true,
        message: "Cache cleared",
        timestamp: now_iso(),
    })
}
