//! Yahoo Finance chart API client for monthly history.
//!
//! Uses the unofficial chart endpoint (no key). Missing closes are kept as gaps.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{is_success, send, SeriesSource, SourceRequest};
use crate::error::ProviderError;
use crate::types::{DateRange, Series, TimePoint};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const PROVIDER: &str = "yahoo";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Option<Vec<Option<f64>>>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

fn parse_chart(status: u16, body: &str) -> Result<YahooResult, ProviderError> {
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let data: YahooChartResponse = serde_json::from_str(body)?;

    if let Some(error) = data.chart.error {
        let message = format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        );
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            ProviderError::NotFound(message)
        } else {
            ProviderError::MalformedResponse(message)
        });
    }

    data.chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::MalformedResponse("empty chart result".to_string()))
}

/// Parse a chart body into a close-price series. Null closes stay null.
pub fn parse_chart_series(status: u16, body: &str, symbol: &str) -> Result<Series, ProviderError> {
    let result = parse_chart(status, body)?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();

    let points = timestamps
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| {
            let close = closes.get(i).copied().flatten().filter(|v| v.is_finite());
            TimePoint::new(timestamp, close)
        })
        .collect();

    Ok(Series::from_unsorted(symbol, points))
}

fn range_params(range: Option<DateRange>) -> Vec<(&'static str, String)> {
    let window = range.and_then(|r| {
        let start = r.start.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
        let end = r.end.and_hms_opt(23, 59, 59)?.and_utc().timestamp();
        Some((start, end))
    });
    match window {
        Some((start, end)) => vec![("period1", start.to_string()), ("period2", end.to_string())],
        None => vec![("range", "10y".to_string())],
    }
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: YAHOO_CHART_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chart(
        &self,
        symbol: &str,
        range: Option<DateRange>,
        interval: &str,
    ) -> Result<(u16, String), ProviderError> {
        let url = format!("{}/{}", self.base_url, normalize_yahoo_symbol(symbol));
        debug!("Fetching Yahoo Finance chart: {} ({})", url, interval);

        let mut params = range_params(range);
        params.push(("interval", interval.to_string()));
        params.push(("includePrePost", "false".to_string()));

        send(self.client.get(&url).query(&params)).await
    }
}

#[async_trait]
impl SeriesSource for YahooFinanceClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_series(&self, request: &SourceRequest) -> Result<Series, ProviderError> {
        let (status, body) = self.chart(&request.query, request.range, "1mo").await?;
        parse_chart_series(status, &body, &request.query)
    }
}
