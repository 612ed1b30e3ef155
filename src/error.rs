use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure classification reported by a provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    NotFound,
    TransportFailure,
    MalformedResponse,
}

impl ProviderErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::TransportFailure => "transport_failure",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

/// Errors returned by upstream provider adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider explicitly signalled throttling.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider answered but had no data for the query.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error, timeout or a non-success status.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The body did not match the expected schema.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::RateLimited(_) => ProviderErrorKind::RateLimited,
            Self::NotFound(_) => ProviderErrorKind::NotFound,
            Self::TransportFailure(_) => ProviderErrorKind::TransportFailure,
            Self::MalformedResponse(_) => ProviderErrorKind::MalformedResponse,
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, context: &str) -> Self {
        match status {
            429 => Self::RateLimited(format!("{} returned HTTP 429", context)),
            404 => Self::NotFound(format!("{} returned HTTP 404", context)),
            _ => Self::TransportFailure(format!("{} returned HTTP {}", context, status)),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::TransportFailure(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

/// The single condition the orchestration layer reacts to: the slot falls back.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} unavailable: {reason}")]
pub struct ProviderUnavailable {
    pub provider: &'static str,
    pub kind: Option<ProviderErrorKind>,
    pub reason: String,
}

impl ProviderUnavailable {
    pub fn new(provider: &'static str, error: &ProviderError) -> Self {
        Self {
            provider,
            kind: Some(error.kind()),
            reason: error.to_string(),
        }
    }

    /// The provider has no credentials configured.
    pub fn not_configured(provider: &'static str) -> Self {
        Self {
            provider,
            kind: None,
            reason: "credentials not configured".to_string(),
        }
    }

    /// The provider answered but the derived signal failed validation.
    pub fn invalid(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            provider,
            kind: Some(ProviderErrorKind::MalformedResponse),
            reason: reason.into(),
        }
    }

    /// Every call of a multi-call run failed.
    pub fn exhausted(provider: &'static str, attempted: usize) -> Self {
        Self {
            provider,
            kind: None,
            reason: format!("all {} calls failed", attempted),
        }
    }
}

/// Structural contract violations inside the index engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("series is not sorted: timestamp {next} follows {previous}")]
    UnsortedSeries { previous: i64, next: i64 },

    #[error("series has duplicate timestamp {0}")]
    DuplicateTimestamp(i64),

    #[error("invalid date key: {0:?}")]
    InvalidDateKey(String),

    #[error("negative weight {weight} for {symbol}")]
    NegativeWeight { symbol: String, weight: f64 },
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
