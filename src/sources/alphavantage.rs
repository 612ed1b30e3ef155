//! Alpha Vantage API client for monthly history and company fundamentals.
//!
//! Free tier allows 5 requests per minute and 25 per day. Throttling is reported in the
//! body of a 200 response (`Note` / `Information`), not through the status code.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{clip_to_range, is_success, send, QuoteSource, SeriesSource, SourceRequest};
use crate::error::ProviderError;
use crate::types::{CompanyProfile, Quote, Series, TimePoint};

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "alphavantage";

/// Notices Alpha Vantage puts in place of data.
#[derive(Debug, Default, Deserialize)]
struct Notice {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

impl Notice {
    fn check(&self) -> Result<(), ProviderError> {
        if let Some(message) = self.note.as_ref().or(self.information.as_ref()) {
            return Err(ProviderError::RateLimited(message.clone()));
        }
        if let Some(message) = &self.error_message {
            return Err(ProviderError::NotFound(message.clone()));
        }
        Ok(())
    }
}

/// TIME_SERIES_MONTHLY response.
#[derive(Debug, Deserialize)]
struct MonthlyResponse {
    #[serde(flatten)]
    notice: Notice,
    #[serde(rename = "Monthly Time Series")]
    time_series: Option<HashMap<String, MonthlyBar>>,
}

#[derive(Debug, Deserialize)]
struct MonthlyBar {
    #[serde(rename = "4. close")]
    close: Option<String>,
}

/// OVERVIEW response. Every field is a string; missing numbers are `"None"` or `"-"`.
#[derive(Debug, Deserialize)]
struct CompanyOverview {
    #[serde(flatten)]
    notice: Notice,
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "RevenueTTM")]
    revenue_ttm: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    quarterly_revenue_growth_yoy: Option<String>,
    #[serde(rename = "ProfitMargin")]
    profit_margin: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
}

/// Parse an Alpha Vantage numeric string. Placeholders become `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    match s.trim() {
        "" | "None" | "-" => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn number(field: &Option<String>) -> Option<f64> {
    field.as_deref().and_then(parse_number)
}

fn text(field: Option<String>) -> Option<String> {
    field.filter(|s| !matches!(s.trim(), "" | "None" | "-"))
}

/// Parse a TIME_SERIES_MONTHLY body into a close-price series.
pub fn parse_monthly_series(status: u16, body: &str, symbol: &str) -> Result<Series, ProviderError> {
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let response: MonthlyResponse = serde_json::from_str(body)?;
    response.notice.check()?;

    let time_series = response.time_series.ok_or_else(|| {
        ProviderError::MalformedResponse(format!("no monthly time series for {}", symbol))
    })?;

    let points = time_series
        .into_iter()
        .filter_map(|(date, bar)| {
            let day = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?;
            let timestamp = day.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
            Some(TimePoint::new(timestamp, number(&bar.close)))
        })
        .collect();

    Ok(Series::from_unsorted(symbol, points))
}

/// Parse an OVERVIEW body into a quote with profile data.
pub fn parse_overview(status: u16, body: &str, symbol: &str) -> Result<Quote, ProviderError> {
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let overview: CompanyOverview = serde_json::from_str(body)?;
    overview.notice.check()?;

    let reported_symbol = text(overview.symbol)
        .ok_or_else(|| ProviderError::NotFound(format!("no overview for {}", symbol)))?;

    Ok(Quote {
        symbol: reported_symbol,
        name: text(overview.name),
        price: None,
        change_percent: None,
        market_cap: number(&overview.market_cap),
        profile: CompanyProfile {
            sector: text(overview.sector),
            industry: text(overview.industry),
            description: text(overview.description),
            revenue_ttm: number(&overview.revenue_ttm),
            quarterly_revenue_growth_yoy: number(&overview.quarterly_revenue_growth_yoy),
            profit_margin: number(&overview.profit_margin),
            pe_ratio: number(&overview.pe_ratio),
        },
    })
}

/// Alpha Vantage API client.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client.
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: ALPHA_VANTAGE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<(u16, String), ProviderError> {
        debug!("Fetching Alpha Vantage {} for {}", function, symbol);
        send(self.client.get(&self.base_url).query(&[
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ]))
        .await
    }
}

#[async_trait]
impl SeriesSource for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_series(&self, request: &SourceRequest) -> Result<Series, ProviderError> {
        let (status, body) = self.query("TIME_SERIES_MONTHLY", &request.query).await?;
        let series = parse_monthly_series(status, &body, &request.query)?;
        Ok(clip_to_range(series, request.range))
    }
}

#[async_trait]
impl QuoteSource for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_quote(&self, request: &SourceRequest) -> Result<Quote, ProviderError> {
        let (status, body) = self.query("OVERVIEW", &request.query).await?;
        parse_overview(status, &body, &request.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    const MONTHLY: &str = r#"{
        "Meta Data": {"2. Symbol": "ROK"},
        "Monthly Time Series": {
            "2024-02-29": {"1. open": "280.0", "4. close": "285.50", "5. volume": "100"},
            "2024-01-31": {"1. open": "300.0", "4. close": "277.10", "5. volume": "100"},
            "2023-12-29": {"1. open": "290.0", "4. close": "None", "5. volume": "100"}
        }
    }"#;

    const OVERVIEW: &str = r#"{
        "Symbol": "ROK",
        "Name": "Rockwell Automation Inc",
        "Description": "Industrial automation and digital transformation.",
        "Sector": "INDUSTRIALS",
        "Industry": "SPECIALTY INDUSTRIAL MACHINERY",
        "MarketCapitalization": "45123000000",
        "RevenueTTM": "8264000000",
        "QuarterlyRevenueGrowthYOY": "-0.082",
        "ProfitMargin": "0.114",
        "PERatio": "-"
    }"#;

    // =========================================================================
    // parse_number Tests
    // =========================================================================

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1.25"), Some(1.25));
        assert_eq!(parse_number(" -0.5 "), Some(-0.5));
        assert_eq!(parse_number("None"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    // =========================================================================
    // parse_monthly_series Tests
    // =========================================================================

    #[test]
    fn test_monthly_series_sorted_with_gaps() {
        let series = parse_monthly_series(200, MONTHLY, "ROK").unwrap();
        assert_eq!(series.symbol(), "ROK");
        let keys: Vec<String> = series
            .points()
            .iter()
            .filter_map(|p| p.period())
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02"]);
        assert_eq!(series.points()[0].value, None);
        assert_eq!(series.points()[2].value, Some(285.5));
    }

    #[test]
    fn test_monthly_series_rate_limited_note() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let err = parse_monthly_series(200, body, "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    #[test]
    fn test_monthly_series_rate_limited_information() {
        let body = r#"{"Information": "We have detected your API key and our standard API rate limit is 25 requests per day."}"#;
        let err = parse_monthly_series(200, body, "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    #[test]
    fn test_monthly_series_error_message_is_not_found() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        let err = parse_monthly_series(200, body, "XXXX").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::NotFound);
    }

    #[test]
    fn test_monthly_series_missing_series_is_malformed() {
        let err = parse_monthly_series(200, r#"{"Meta Data": {}}"#, "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::MalformedResponse);

        let err = parse_monthly_series(200, "<html>", "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::MalformedResponse);
    }

    #[test]
    fn test_monthly_series_http_errors() {
        let err = parse_monthly_series(503, "", "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::TransportFailure);

        let err = parse_monthly_series(429, "", "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }

    // =========================================================================
    // parse_overview Tests
    // =========================================================================

    #[test]
    fn test_overview_fields() {
        let quote = parse_overview(200, OVERVIEW, "ROK").unwrap();
        assert_eq!(quote.symbol, "ROK");
        assert_eq!(quote.name.as_deref(), Some("Rockwell Automation Inc"));
        assert_eq!(quote.market_cap, Some(45_123_000_000.0));
        assert_eq!(quote.profile.revenue_ttm, Some(8_264_000_000.0));
        assert_eq!(quote.profile.quarterly_revenue_growth_yoy, Some(-0.082));
        assert_eq!(quote.profile.profit_margin, Some(0.114));
        assert_eq!(quote.profile.pe_ratio, None);
        assert!(quote.price.is_none());
    }

    #[test]
    fn test_overview_empty_body_is_not_found() {
        let err = parse_overview(200, "{}", "FANUY").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::NotFound);
    }

    #[test]
    fn test_overview_note_wins_over_data() {
        let body = r#"{"Note": "call frequency", "Symbol": "NVDA"}"#;
        let err = parse_overview(200, body, "NVDA").unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
    }
}
