use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::PeriodKey;

/// A credential read from the environment. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Which provider serves monthly price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesProvider {
    AlphaVantage,
    Yahoo,
}

impl FromStr for SeriesProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alphavantage" | "alpha_vantage" | "alpha-vantage" => Ok(Self::AlphaVantage),
            "yahoo" => Ok(Self::Yahoo),
            other => Err(format!("unknown series source: {}", other)),
        }
    }
}

/// Fixed gap between consecutive calls to each provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDelays {
    pub alpha_vantage: Duration,
    pub yahoo: Duration,
    pub uspto: Duration,
    pub newsapi: Duration,
    pub adzuna: Duration,
}

impl ProviderDelays {
    /// No pacing at all.
    pub fn none() -> Self {
        Self {
            alpha_vantage: Duration::ZERO,
            yahoo: Duration::ZERO,
            uspto: Duration::ZERO,
            newsapi: Duration::ZERO,
            adzuna: Duration::ZERO,
        }
    }
}

impl Default for ProviderDelays {
    fn default() -> Self {
        Self {
            alpha_vantage: Duration::from_millis(12_000), // 5 calls/minute
            yahoo: Duration::from_millis(500),
            uspto: Duration::from_millis(1_000),
            newsapi: Duration::from_millis(1_000),
            adzuna: Duration::from_millis(1_000),
        }
    }
}

/// Cache lifetimes by data volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Single signals.
    pub default: Duration,
    /// All-companies fundamentals.
    pub companies: Duration,
    /// Multi-symbol monthly history.
    pub performance: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(300),
            companies: Duration::from_secs(3_600),
            performance: Duration::from_secs(86_400),
        }
    }
}

/// Upper bound on the chart window, one century.
pub const MAX_WINDOW_MONTHS: u32 = 1_200;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    pub alpha_vantage_api_key: Option<ApiKey>,
    pub news_api_key: Option<ApiKey>,
    pub adzuna_app_id: Option<ApiKey>,
    pub adzuna_app_key: Option<ApiKey>,
    pub series_source: SeriesProvider,
    /// Per-call timeout for every provider request.
    pub request_timeout: Duration,
    pub delays: ProviderDelays,
    pub ttls: CacheTtls,
    /// Period at which every series is indexed to 100.
    pub performance_base_date: PeriodKey,
    /// Trailing window of published chart points.
    pub performance_window_months: u32,
}

fn default_base_date() -> PeriodKey {
    PeriodKey::new(2024, 1).unwrap_or_else(|_| PeriodKey::from_date(chrono::Utc::now().date_naive()))
}

fn env_key(name: &str) -> Option<ApiKey> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(ApiKey)
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default: Duration) -> Duration {
    Duration::from_millis(env_parse(name, default.as_millis() as u64))
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(name, default.as_secs()))
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let alpha_vantage_api_key = env_key("ALPHA_VANTAGE_API_KEY");

        let series_source = env::var("SERIES_SOURCE")
            .ok()
            .and_then(|s| match s.parse::<SeriesProvider>() {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("{}, choosing by available keys", e);
                    None
                }
            })
            .unwrap_or(if alpha_vantage_api_key.is_some() {
                SeriesProvider::AlphaVantage
            } else {
                SeriesProvider::Yahoo
            });

        let performance_base_date = match env::var("PERFORMANCE_BASE_DATE") {
            Ok(raw) => PeriodKey::parse(&raw).unwrap_or_else(|e| {
                warn!("PERFORMANCE_BASE_DATE: {}, using {}", e, defaults.performance_base_date);
                defaults.performance_base_date
            }),
            Err(_) => defaults.performance_base_date,
        };

        let delays = ProviderDelays {
            alpha_vantage: env_millis("ALPHA_VANTAGE_DELAY_MS", defaults.delays.alpha_vantage),
            yahoo: env_millis("YAHOO_DELAY_MS", defaults.delays.yahoo),
            uspto: env_millis("USPTO_DELAY_MS", defaults.delays.uspto),
            newsapi: env_millis("NEWSAPI_DELAY_MS", defaults.delays.newsapi),
            adzuna: env_millis("ADZUNA_DELAY_MS", defaults.delays.adzuna),
        };

        let ttls = CacheTtls {
            default: env_secs("CACHE_TTL_SECS", defaults.ttls.default),
            companies: env_secs("COMPANIES_TTL_SECS", defaults.ttls.companies),
            performance: env_secs("PERFORMANCE_TTL_SECS", defaults.ttls.performance),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            alpha_vantage_api_key,
            news_api_key: env_key("NEWS_API_KEY"),
            adzuna_app_id: env_key("ADZUNA_APP_ID"),
            adzuna_app_key: env_key("ADZUNA_APP_KEY"),
            series_source,
            request_timeout: env_secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            delays,
            ttls,
            performance_base_date,
            performance_window_months: env_parse(
                "PERFORMANCE_WINDOW_MONTHS",
                defaults.performance_window_months,
            )
            .min(MAX_WINDOW_MONTHS),
        }
    }

    /// Log which credentials are present, without their values.
    pub fn log_summary(&self) {
        let presence = |key: &Option<ApiKey>| if key.is_some() { "present" } else { "missing" };
        info!("Alpha Vantage key: {}", presence(&self.alpha_vantage_api_key));
        info!("NewsAPI key: {}", presence(&self.news_api_key));
        info!(
            "Adzuna credentials: {}",
            if self.adzuna_app_id.is_some() && self.adzuna_app_key.is_some() {
                "present"
            } else {
                "missing"
            }
        );
        info!("Monthly series source: {:?}", self.series_source);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            alpha_vantage_api_key: None,
            news_api_key: None,
            adzuna_app_id: None,
            adzuna_app_key: None,
            series_source: SeriesProvider::Yahoo,
            request_timeout: Duration::from_secs(15),
            delays: ProviderDelays::default(),
            ttls: CacheTtls::default(),
            performance_base_date: default_base_date(),
            performance_window_months: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.delays.alpha_vantage, Duration::from_secs(12));
        assert_eq!(config.ttls.default, Duration::from_secs(300));
        assert!(config.ttls.companies > config.ttls.default);
        assert!(config.ttls.performance > config.ttls.companies);
        assert_eq!(config.performance_base_date.to_string(), "2024-01");
        assert_eq!(config.performance_window_months, 24);
    }

    #[test]
    fn test_series_provider_from_str() {
        assert_eq!("yahoo".parse::<SeriesProvider>(), Ok(SeriesProvider::Yahoo));
        assert_eq!(
            "AlphaVantage".parse::<SeriesProvider>(),
            Ok(SeriesProvider::AlphaVantage)
        );
        assert!("bloomberg".parse::<SeriesProvider>().is_err());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("SECRET123");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "SECRET123");
    }

    #[test]
    fn test_window_months_is_capped() {
        std::env::set_var("PERFORMANCE_WINDOW_MONTHS", "2147483648");
        let config = Config::from_env();
        std::env::remove_var("PERFORMANCE_WINDOW_MONTHS");
        assert_eq!(config.performance_window_months, MAX_WINDOW_MONTHS);
    }

    #[test]
    fn test_env_parse_falls_back() {
        assert_eq!(env_parse("ROBOFUTURES_TEST_UNSET_VAR", 42u16), 42);
    }
}
