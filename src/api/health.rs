use crate::services::{now_iso, CacheStats};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
    cache: CacheSummary,
}

#[derive(Serialize)]
struct CacheSummary {
    keys: usize,
    stats: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.cache.stats();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now_iso(),
        cache: CacheSummary {
            keys: stats.keys,
            stats,
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
