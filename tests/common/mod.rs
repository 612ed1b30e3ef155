//! Mock providers shared by the integration tests. None of them touch the network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use robofutures::config::{Config, ProviderDelays};
use robofutures::error::ProviderError;
use robofutures::services::{Paced, SignalProviders};
use robofutures::sources::{CountSource, QuoteSource, SeriesSource, SourceRequest};
use robofutures::{
    CompanyProfile, Count, CountItem, PeriodKey, Providers, Quote, Series, TimePoint,
};

pub struct MockCounts {
    pub calls: AtomicUsize,
    pub result: Result<Count, ProviderError>,
}

impl MockCounts {
    pub fn ok(count: u64) -> Arc<Self> {
        let items = (0..3)
            .map(|i| CountItem {
                date: Some(Utc::now().date_naive().format("%Y-%m-%d").to_string()),
                category: Some("Robotics".to_string()),
                title: Some(format!("Robotics software engineer {}", i)),
                detail: Some("government subsidy for automation".to_string()),
                url: None,
            })
            .collect();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            result: Ok(Count { count, items }),
        })
    }

    pub fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            result: Err(error),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CountSource for MockCounts {
    fn name(&self) -> &'static str {
        "mock-counts"
    }

    async fn fetch_count(&self, _request: &SourceRequest) -> Result<Count, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Quotes for every symbol except the ones listed in `failing`.
pub struct MockQuotes {
    pub calls: AtomicUsize,
    pub failing: Vec<&'static str>,
}

impl MockQuotes {
    pub fn new(failing: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockQuotes {
    fn name(&self) -> &'static str {
        "mock-quotes"
    }

    async fn fetch_quote(&self, request: &SourceRequest) -> Result<Quote, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&request.query.as_str()) {
            return Err(ProviderError::RateLimited("call frequency exceeded".into()));
        }
        Ok(Quote {
            symbol: request.query.clone(),
            name: Some(format!("{} Robotics Inc", request.query)),
            price: Some(120.0),
            change_percent: Some(1.5),
            market_cap: Some(50_000_000_000.0),
            profile: CompanyProfile {
                sector: Some("TECHNOLOGY".to_string()),
                industry: Some("Industrial automation".to_string()),
                description: Some("Builds robotics and automation systems".to_string()),
                revenue_ttm: Some(8_000_000_000.0),
                quarterly_revenue_growth_yoy: Some(0.12),
                profit_margin: Some(0.15),
                pe_ratio: Some(30.0),
            },
        })
    }
}

/// Monthly closes from January 2023 to the current month, rising one point a month.
pub struct MockSeries {
    pub calls: AtomicUsize,
    pub available: bool,
}

impl MockSeries {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            available,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn monthly_series(symbol: &str) -> Series {
    let current = PeriodKey::from_date(Utc::now().date_naive());
    let mut key = PeriodKey::new(2023, 1).unwrap();
    let mut points = Vec::new();
    let mut value = 100.0;
    while key <= current {
        points.push(TimePoint::at(key, Some(value)));
        key = key.offset_months(1);
        value += 1.0;
    }
    Series::new(symbol, points).unwrap()
}

#[async_trait]
impl SeriesSource for MockSeries {
    fn name(&self) -> &'static str {
        "mock-series"
    }

    async fn fetch_series(&self, request: &SourceRequest) -> Result<Series, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(monthly_series(&request.query))
        } else {
            Err(ProviderError::NotFound(format!("no history for {}", request.query)))
        }
    }
}

pub fn paced<S: ?Sized>(source: Arc<S>) -> Paced<S> {
    Paced::new(source, Duration::ZERO)
}

pub fn test_config() -> Config {
    Config {
        delays: ProviderDelays::none(),
        ..Config::default()
    }
}

/// Every slot wired to a healthy mock.
pub fn healthy_providers(
    counts: &Arc<MockCounts>,
    quotes: &Arc<MockQuotes>,
    series: &Arc<MockSeries>,
) -> Providers {
    let counts: Arc<dyn CountSource> = counts.clone();
    let quotes: Arc<dyn QuoteSource> = quotes.clone();
    let series: Arc<dyn SeriesSource> = series.clone();

    Providers {
        signals: SignalProviders {
            patents: Some(paced(counts.clone())),
            jobs: Some(paced(counts.clone())),
            news: Some(paced(counts)),
            fundamentals: Some(paced(quotes.clone())),
        },
        quotes: Some(paced(quotes)),
        series: Some(paced(series)),
    }
}
