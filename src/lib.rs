//! RoboFutures - signal aggregation server for the robotics investment dashboard

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::{Config, SeriesProvider};
use services::{
    CompanyService, Paced, PerformanceService, ResponseCache, SignalProviders, SignalService,
};
use sources::{
    AdzunaClient, AlphaVantageClient, CountSource, NewsApiClient, QuoteSource, SeriesSource,
    UsptoClient, YahooFinanceClient,
};

pub use types::*;

/// Provider wiring for every service. A `None` slot is served from substitutes.
#[derive(Clone, Default)]
pub struct Providers {
    pub signals: SignalProviders,
    pub quotes: Option<Paced<dyn QuoteSource>>,
    pub series: Option<Paced<dyn SeriesSource>>,
}

impl Providers {
    /// Build the real adapters for whatever credentials the config carries.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let client = sources::http_client(config.request_timeout)?;
        let delays = &config.delays;

        let alpha_vantage: Option<Arc<AlphaVantageClient>> = config
            .alpha_vantage_api_key
            .as_ref()
            .map(|key| Arc::new(AlphaVantageClient::new(client.clone(), key.expose().to_string())));

        let fundamentals = alpha_vantage
            .clone()
            .map(|av| Paced::new(av as Arc<dyn QuoteSource>, delays.alpha_vantage));

        let patents = Paced::new(
            Arc::new(UsptoClient::new(client.clone())) as Arc<dyn CountSource>,
            delays.uspto,
        );

        let jobs = match (&config.adzuna_app_id, &config.adzuna_app_key) {
            (Some(id), Some(key)) => Some(Paced::new(
                Arc::new(AdzunaClient::new(
                    client.clone(),
                    id.expose().to_string(),
                    key.expose().to_string(),
                )) as Arc<dyn CountSource>,
                delays.adzuna,
            )),
            _ => None,
        };

        let news = config.news_api_key.as_ref().map(|key| {
            Paced::new(
                Arc::new(NewsApiClient::new(client.clone(), key.expose().to_string()))
                    as Arc<dyn CountSource>,
                delays.newsapi,
            )
        });

        let series = match config.series_source {
            SeriesProvider::AlphaVantage => alpha_vantage
                .map(|av| Paced::new(av as Arc<dyn SeriesSource>, delays.alpha_vantage)),
            SeriesProvider::Yahoo => Some(Paced::new(
                Arc::new(YahooFinanceClient::new(client)) as Arc<dyn SeriesSource>,
                delays.yahoo,
            )),
        };

        Ok(Self {
            signals: SignalProviders {
                patents: Some(patents),
                jobs,
                news,
                fundamentals: fundamentals.clone(),
            },
            quotes: fundamentals,
            series,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ResponseCache>,
    pub signals: Arc<SignalService>,
    pub companies: Arc<CompanyService>,
    pub performance: Arc<PerformanceService>,
}

impl AppState {
    pub fn new(config: Config, providers: Providers) -> Self {
        let cache = Arc::new(ResponseCache::new(config.ttls.default));

        let signals = Arc::new(SignalService::new(
            cache.clone(),
            providers.signals,
            config.ttls.default,
        ));
        let companies = Arc::new(CompanyService::new(
            cache.clone(),
            providers.quotes,
            config.ttls.companies,
        ));
        let performance = Arc::new(PerformanceService::new(
            cache.clone(),
            providers.series,
            config.ttls.performance,
            config.performance_base_date,
            config.performance_window_months,
        ));

        Self {
            config: Arc::new(config),
            cache,
            signals,
            companies,
            performance,
        }
    }
}
