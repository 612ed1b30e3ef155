//! NewsAPI `everything` search client. Free tier: 100 requests per day.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{is_success, send, CountSource, SourceRequest};
use crate::error::ProviderError;
use crate::types::{Count, CountItem};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PROVIDER: &str = "newsapi";
const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    source: Option<ArticleSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// Parse an `everything` body. Error envelopes are checked before the status code since
/// NewsAPI reports throttling both ways.
pub fn parse_everything(status: u16, body: &str) -> Result<Count, ProviderError> {
    let data: EverythingResponse = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(_) if !is_success(status) => return Err(ProviderError::from_status(status, PROVIDER)),
        Err(e) => return Err(e.into()),
    };

    if data.status == "error" {
        let code = data.code.unwrap_or_default();
        let message = format!("{}: {}", code, data.message.unwrap_or_default());
        return Err(if code == "rateLimited" {
            ProviderError::RateLimited(message)
        } else {
            ProviderError::TransportFailure(message)
        });
    }
    if !is_success(status) {
        return Err(ProviderError::from_status(status, PROVIDER));
    }

    let items: Vec<CountItem> = data
        .articles
        .into_iter()
        .map(|article| CountItem {
            date: article.published_at,
            category: article.source.and_then(|s| s.name),
            title: article.title,
            detail: article.description,
            url: article.url,
        })
        .collect();

    Ok(Count {
        count: data.total_results.unwrap_or(items.len() as u64),
        items,
    })
}

/// NewsAPI client.
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: NEWSAPI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CountSource for NewsApiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_count(&self, request: &SourceRequest) -> Result<Count, ProviderError> {
        let mut params = vec![
            ("q", request.query.clone()),
            ("language", "en".to_string()),
            ("sortBy", "relevancy".to_string()),
            (
                "pageSize",
                request.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
            ),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some(range) = request.range {
            params.push(("from", range.start.format("%Y-%m-%d").to_string()));
            params.push(("to", range.end.format("%Y-%m-%d").to_string()));
        }

        debug!("Fetching NewsAPI articles for {:?}", request.query);

        let (status, body) = send(self.client.get(&self.base_url).query(&params)).await?;
        parse_everything(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    #[test]
    fn test_parse_everything() {
        let body = r#"{
            "status": "ok",
            "totalResults": 37,
            "articles": [{
                "source": {"id": null, "name": "Reuters"},
                "title": "Senate backs robotics subsidy",
                "description": "New funding for domestic production",
                "url": "https://example.com/a",
                "publishedAt": "2024-05-02T10:00:00Z"
            }]
        }"#;
        let count = parse_everything(200, body).unwrap();
        assert_eq!(count.count, 37);
        let item = &count.items[0];
        assert_eq!(item.category.as_deref(), Some("Reuters"));
        assert!(item.text().contains("subsidy"));
        assert!(item.text().contains("domestic"));
    }

    #[test]
    fn test_parse_everything_rate_limited() {
        let body = r#"{"status": "error", "code": "rateLimited", "message": "You have made too many requests recently."}"#;
        assert_eq!(
            parse_everything(429, body).unwrap_err().kind(),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            parse_everything(200, body).unwrap_err().kind(),
            ProviderErrorKind::RateLimited
        );
    }

    #[test]
    fn test_parse_everything_other_error_codes() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
        assert_eq!(
            parse_everything(401, body).unwrap_err().kind(),
            ProviderErrorKind::TransportFailure
        );
    }

    #[test]
    fn test_parse_everything_non_json() {
        assert_eq!(
            parse_everything(502, "Bad Gateway").unwrap_err().kind(),
            ProviderErrorKind::TransportFailure
        );
        assert_eq!(
            parse_everything(200, "Bad Gateway").unwrap_err().kind(),
            ProviderErrorKind::MalformedResponse
        );
    }
}
