//! Adzuna job search client. Free tier: 250 requests per day.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{is_success, send, CountSource, SourceRequest};
use crate::error::ProviderError;
use crate::types::{Count, CountItem};

const ADZUNA_URL: &str = "https://api.adzuna.com/v1/api/jobs/us/search/1";
const PROVIDER: &str = "adzuna";
const DEFAULT_RESULTS: u32 = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    count: Option<u64>,
    results: Option<Vec<Job>>,
}

#[derive(Debug, Deserialize)]
struct Job {
    title: Option<String>,
    company: Option<Named>,
    location: Option<Named>,
    category: Option<Labelled>,
    created: Option<String>,
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Labelled {
    label: Option<String>,
}

/// Parse a job search body. Detail is `company, location`.
pub fn parse_search(status: u16, body: &str) -> Result<Count, ProviderError> {
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let data: SearchResponse = serde_json::from_str(body)?;
    let jobs = data
        .results
        .ok_or_else(|| ProviderError::MalformedResponse("missing results".to_string()))?;

    let items: Vec<CountItem> = jobs
        .into_iter()
        .map(|job| {
            let company = job.company.and_then(|c| c.display_name);
            let location = job.location.and_then(|l| l.display_name);
            let detail = match (company, location) {
                (Some(c), Some(l)) => Some(format!("{}, {}", c, l)),
                (c, l) => c.or(l),
            };
            CountItem {
                date: job.created,
                category: job.category.and_then(|c| c.label),
                title: job.title,
                detail,
                url: job.redirect_url,
            }
        })
        .collect();

    Ok(Count {
        count: data.count.unwrap_or(0),
        items,
    })
}

/// Adzuna API client.
pub struct AdzunaClient {
    client: Client,
    app_id: String,
    app_key: String,
    base_url: String,
}

impl AdzunaClient {
    pub fn new(client: Client, app_id: String, app_key: String) -> Self {
        Self {
            client,
            app_id,
            app_key,
            base_url: ADZUNA_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CountSource for AdzunaClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_count(&self, request: &SourceRequest) -> Result<Count, ProviderError> {
        debug!("Fetching Adzuna postings for {:?}", request.query);

        let (status, body) = send(self.client.get(&self.base_url).query(&[
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
            ("what", request.query.clone()),
            (
                "results_per_page",
                request.limit.unwrap_or(DEFAULT_RESULTS).to_string(),
            ),
        ]))
        .await?;

        parse_search(status, &body)
    }
}
