//! Upstream provider adapters.
//!
//! Each adapter talks to exactly one external service and implements one or more of the
//! capability traits below. Adapters never touch the response cache. Transport and
//! parsing are split: every adapter exposes pure `parse_*` functions that turn a raw
//! status and body into a record or a [`ProviderError`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::error::ProviderError;
use crate::types::{Count, DateRange, Quote, Series};

pub mod adzuna;
pub mod alphavantage;
pub mod newsapi;
pub mod uspto;
pub mod yahoo;

pub use adzuna::AdzunaClient;
pub use alphavantage::AlphaVantageClient;
pub use newsapi::NewsApiClient;
pub use uspto::UsptoClient;
pub use yahoo::YahooFinanceClient;

/// Query handed to an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    /// Symbol or free-text search.
    pub query: String,
    pub range: Option<DateRange>,
    /// Result-size hint.
    pub limit: Option<u32>,
}

impl SourceRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            range: None,
            limit: None,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Monthly history for a symbol.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_series(&self, request: &SourceRequest) -> Result<Series, ProviderError>;
}

/// Point-in-time quote and company profile for a symbol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_quote(&self, request: &SourceRequest) -> Result<Quote, ProviderError>;
}

/// Number of matching items (patents, articles, postings) plus a page of them.
#[async_trait]
pub trait CountSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_count(&self, request: &SourceRequest) -> Result<Count, ProviderError>;
}

/// Human-readable provenance for records built from a provider's data.
pub fn source_label(provider: &str) -> String {
    match provider {
        "alphavantage" => "Alpha Vantage API",
        "yahoo" => "Yahoo Finance API",
        "uspto" => "USPTO PEDS API",
        "newsapi" => "NewsAPI",
        "adzuna" => "Adzuna API",
        other => other,
    }
    .to_string()
}

/// Build the HTTP client shared by all adapters.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("robofutures/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Send a request and read the whole body. Non-success statuses are returned, not mapped,
/// so the parser can inspect provider error envelopes first.
pub(crate) async fn send(request: RequestBuilder) -> Result<(u16, String), ProviderError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok((status, body))
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Keep only points whose period falls inside the requested range.
pub(crate) fn clip_to_range(series: Series, range: Option<DateRange>) -> Series {
    let Some(range) = range else {
        return series;
    };
    let start = crate::types::PeriodKey::from_date(range.start);
    let end = crate::types::PeriodKey::from_date(range.end);
    let symbol = series.symbol().to_string();
    let points = series
        .points()
        .iter()
        .filter(|p| p.period().is_some_and(|k| k >= start && k <= end))
        .copied()
        .collect();
    Series::from_unsorted(symbol, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PeriodKey, TimePoint};
    use chrono::NaiveDate;

    #[test]
    fn test_source_request_builder() {
        let request = SourceRequest::new("NVDA").with_limit(50);
        assert_eq!(request.query, "NVDA");
        assert_eq!(request.limit, Some(50));
        assert!(request.range.is_none());
    }

    #[test]
    fn test_clip_to_range_is_month_granular() {
        let points = ["2023-11", "2023-12", "2024-01", "2024-02"]
            .iter()
            .map(|k| TimePoint::at(PeriodKey::parse(k).unwrap(), Some(1.0)))
            .collect();
        let series = Series::from_unsorted("SPY", points);
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 12, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        );

        let clipped = clip_to_range(series, Some(range));
        let keys: Vec<String> = clipped
            .points()
            .iter()
            .filter_map(|p| p.period())
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2023-12", "2024-01"]);
        assert_eq!(clipped.symbol(), "SPY");
    }

    #[test]
    fn test_source_label() {
        assert_eq!(source_label("alphavantage"), "Alpha Vantage API");
        assert_eq!(source_label("mock"), "mock");
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(429));
        assert!(!is_success(500));
    }
}
