use std::sync::Arc;
use std::time::Duration;

use robofutures::config::Config;
use robofutures::{api, AppState, Providers};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robofutures=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Starting RoboFutures server on {}:{}", config.host, config.port);
    config.log_summary();

    let providers = Providers::from_config(&config)?;
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, providers);

    // Expired entries are otherwise only dropped when their key is read again
    {
        let cache = Arc::clone(&state.cache);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CACHE_SWEEP_INTERVAL).await;
                let before = cache.len();
                cache.cleanup();
                let swept = before.saturating_sub(cache.len());
                if swept > 0 {
                    debug!("Swept {} expired cache entries", swept);
                }
            }
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
