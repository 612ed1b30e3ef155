//! USPTO bulk-search client for granted patents. No key required.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{is_success, send, CountSource, SourceRequest};
use crate::error::ProviderError;
use crate::types::{Count, CountItem};

const USPTO_GRANTS_URL: &str = "https://developer.uspto.gov/ibd-api/v1/application/grants";
const PROVIDER: &str = "uspto";
const DEFAULT_ROWS: u32 = 1000;

#[derive(Debug, Deserialize)]
struct GrantsResponse {
    response: Option<GrantsBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantsBody {
    num_found: Option<u64>,
    #[serde(default)]
    docs: Vec<GrantDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantDoc {
    app_filing_date: Option<String>,
    invention_title: Option<String>,
    patent_number: Option<String>,
}

/// Parse a grants search body.
pub fn parse_grants(status: u16, body: &str) -> Result<Count, ProviderError> {
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let data: GrantsResponse = serde_json::from_str(body)?;
    let body = data
        .response
        .ok_or_else(|| ProviderError::MalformedResponse("missing response object".to_string()))?;

    let items: Vec<CountItem> = body
        .docs
        .into_iter()
        .map(|doc| CountItem {
            date: doc.app_filing_date,
            category: None,
            title: doc.invention_title,
            detail: doc.patent_number,
            url: None,
        })
        .collect();

    Ok(Count {
        count: body.num_found.unwrap_or(items.len() as u64),
        items,
    })
}

/// USPTO grants API client.
pub struct UsptoClient {
    client: Client,
    base_url: String,
}

impl UsptoClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: USPTO_GRANTS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CountSource for UsptoClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_count(&self, request: &SourceRequest) -> Result<Count, ProviderError> {
        let start = request
            .range
            .map(|r| r.start)
            .unwrap_or_else(|| (Utc::now() - ChronoDuration::days(365)).date_naive());
        let rows = request.limit.unwrap_or(DEFAULT_ROWS);

        debug!("Fetching USPTO grants since {} ({} rows)", start, rows);

        let (status, body) = send(self.client.get(&self.base_url).query(&[
            ("start", start.format("%Y-%m-%d").to_string()),
            ("rows", rows.to_string()),
            ("searchText", request.query.clone()),
        ]))
        .await?;

        parse_grants(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    #[test]
    fn test_parse_grants() {
        let body = r#"{
            "response": {
                "numFound": 1742,
                "docs": [
                    {"appFilingDate": "2024-05-02T00:00:00Z", "inventionTitle": "Bipedal humanoid gait controller", "patentNumber": "11999001"},
                    {"appFilingDate": "2023-11-20", "inventionTitle": "Robot vision sensor fusion"}
                ]
            }
        }"#;
        let count = parse_grants(200, body).unwrap();
        assert_eq!(count.count, 1742);
        assert_eq!(count.items.len(), 2);
        assert_eq!(
            count.items[0].day(),
            chrono::NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        assert_eq!(count.items[1].detail, None);
    }

    #[test]
    fn test_parse_grants_count_defaults_to_page_size() {
        let body = r#"{"response": {"docs": [{"inventionTitle": "Gripper"}]}}"#;
        assert_eq!(parse_grants(200, body).unwrap().count, 1);
    }

    #[test]
    fn test_parse_grants_errors() {
        assert_eq!(
            parse_grants(200, r#"{"error": "bad"}"#).unwrap_err().kind(),
            ProviderErrorKind::MalformedResponse
        );
        assert_eq!(
            parse_grants(500, "").unwrap_err().kind(),
            ProviderErrorKind::TransportFailure
        );
        assert_eq!(
            parse_grants(404, "").unwrap_err().kind(),
            ProviderErrorKind::NotFound
        );
    }
}
