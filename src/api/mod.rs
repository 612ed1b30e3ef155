pub mod cache;
pub mod dashboard;
pub mod health;
pub mod signals;

use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/cache", cache::router())
        .nest("/api/signals", signals::router())
        .nest("/api/dashboard", dashboard::router())
}
