//! Indexed performance of the robotics basket against market benchmarks.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::{CachedPayload, ResponseCache};
use super::index::{
    align_series, build_timeline, normalize, round_half_up, AlignedSeries, WeightedBasket,
    INDEX_BASE,
};
use super::now_iso;
use super::pacing::Paced;
use crate::config::MAX_WINDOW_MONTHS;
use crate::error::EngineError;
use crate::sources::{source_label, SeriesSource, SourceRequest};
use crate::types::{
    BenchmarkStatus, DateRange, PerformanceMetadata, PerformancePayload, PerformancePoint,
    PeriodKey, PortfolioMember, Series, SOURCE_CACHED,
};

pub const CACHE_KEY: &str = "performance_chart";

/// Basket members and weights.
pub const PORTFOLIO: [(&str, f64); 8] = [
    ("NVDA", 0.25),
    ("ISRG", 0.20),
    ("ROK", 0.15),
    ("ABB", 0.10),
    ("SYM", 0.10),
    ("TSLA", 0.10),
    ("PATH", 0.05),
    ("FANUY", 0.05),
];

/// S&P 500, Nasdaq 100, semiconductors, industrials.
pub const BENCHMARKS: [&str; 4] = ["SPY", "QQQ", "SOXX", "XLI"];

/// Published value for a date: rounded, or the index base when there is no data.
fn published(value: Option<f64>) -> i64 {
    round_half_up(value.unwrap_or(INDEX_BASE)) as i64
}

/// Build the chart from whatever series were fetched, keyed by symbol.
///
/// Returns `Ok(None)` when no portfolio member is available, since there is then no
/// timeline to build on.
pub fn build_performance(
    fetched: &HashMap<String, Series>,
    base: PeriodKey,
    window_months: u32,
    today: NaiveDate,
    source: &str,
) -> Result<Option<PerformancePayload>, EngineError> {
    let normalized: HashMap<&str, _> = fetched
        .iter()
        .filter(|(_, series)| !series.is_empty())
        .map(|(symbol, series)| (symbol.as_str(), normalize(series, base)))
        .collect();

    let Some(timeline_source) = PORTFOLIO
        .iter()
        .find_map(|(symbol, _)| normalized.get(symbol))
    else {
        return Ok(None);
    };
    let timeline = build_timeline(&timeline_source.points);

    let mut basket = WeightedBasket::new();
    for (symbol, weight) in PORTFOLIO {
        if let Some(series) = normalized.get(symbol) {
            basket.add(symbol, weight, align_series(&series.points, &timeline))?;
        }
    }

    let benchmarks: Vec<Option<AlignedSeries>> = BENCHMARKS
        .iter()
        .map(|symbol| {
            normalized
                .get(symbol)
                .map(|series| align_series(&series.points, &timeline))
        })
        .collect();
    let benchmark_at = |i: usize, key: &PeriodKey| {
        published(benchmarks[i].as_ref().and_then(|aligned| aligned.get(key)))
    };

    let cutoff = months_before(today, window_months);
    let data: Vec<PerformancePoint> = timeline
        .iter()
        .filter(|key| **key >= cutoff)
        .map(|key| PerformancePoint {
            month: key.label(),
            date: *key,
            robotics: published(basket.composite_at(key)),
            sp500: benchmark_at(0, key),
            nasdaq: benchmark_at(1, key),
            soxx: benchmark_at(2, key),
            industrials: benchmark_at(3, key),
        })
        .collect();

    let metadata = PerformanceMetadata {
        base_date: base,
        data_points: data.len(),
        portfolio: portfolio_status(|symbol| normalized.contains_key(symbol)),
        benchmarks: benchmark_status(|symbol| normalized.contains_key(symbol)),
        last_updated: now_iso(),
    };

    Ok(Some(PerformancePayload {
        data,
        metadata,
        source: source.to_string(),
    }))
}

/// First month of a trailing window. Windows longer than the cap are capped.
fn months_before(today: NaiveDate, months: u32) -> PeriodKey {
    let months = i32::try_from(months.min(MAX_WINDOW_MONTHS)).unwrap_or(i32::MAX);
    PeriodKey::from_date(today).offset_months(-months)
}

fn portfolio_status(available: impl Fn(&str) -> bool) -> Vec<PortfolioMember> {
    PORTFOLIO
        .iter()
        .map(|(symbol, weight)| PortfolioMember {
            symbol: symbol.to_string(),
            weight: *weight,
            available: available(symbol),
        })
        .collect()
}

fn benchmark_status(available: impl Fn(&str) -> bool) -> Vec<BenchmarkStatus> {
    BENCHMARKS
        .iter()
        .map(|symbol| BenchmarkStatus {
            symbol: symbol.to_string(),
            available: available(symbol),
        })
        .collect()
}

/// Static chart served when no portfolio history could be fetched.
/// Carries the full symbol set, every member flagged unavailable.
pub fn fallback_performance() -> PerformancePayload {
    const ROWS: [(i32, u32, [i64; 5]); 9] = [
        (2024, 1, [100, 100, 100, 100, 100]),
        (2024, 3, [112, 106, 108, 115, 104]),
        (2024, 6, [128, 112, 118, 132, 108]),
        (2024, 9, [142, 118, 125, 145, 112]),
        (2024, 12, [158, 124, 132, 158, 118]),
        (2025, 3, [175, 130, 140, 168, 122]),
        (2025, 6, [195, 136, 148, 180, 128]),
        (2025, 9, [212, 142, 155, 192, 132]),
        (2025, 12, [228, 148, 162, 205, 138]),
    ];

    let data: Vec<PerformancePoint> = ROWS
        .iter()
        .filter_map(|(year, month, [robotics, sp500, nasdaq, soxx, industrials])| {
            let key = PeriodKey::new(*year, *month).ok()?;
            Some(PerformancePoint {
                month: key.label(),
                date: key,
                robotics: *robotics,
                sp500: *sp500,
                nasdaq: *nasdaq,
                soxx: *soxx,
                industrials: *industrials,
            })
        })
        .collect();

    let base_date = data
        .first()
        .map(|p| p.date)
        .unwrap_or_else(|| PeriodKey::from_date(Utc::now().date_naive()));

    PerformancePayload {
        metadata: PerformanceMetadata {
            base_date,
            data_points: data.len(),
            portfolio: portfolio_status(|_| false),
            benchmarks: benchmark_status(|_| false),
            last_updated: now_iso(),
        },
        data,
        source: SOURCE_CACHED.to_string(),
    }
}

/// A chart plus whether it is the static substitute.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    pub payload: PerformancePayload,
    pub fallback: bool,
}

pub struct PerformanceService {
    cache: Arc<ResponseCache>,
    series: Option<Paced<dyn SeriesSource>>,
    ttl: Duration,
    base: PeriodKey,
    window_months: u32,
}

impl PerformanceService {
    pub fn new(
        cache: Arc<ResponseCache>,
        series: Option<Paced<dyn SeriesSource>>,
        ttl: Duration,
        base: PeriodKey,
        window_months: u32,
    ) -> Self {
        Self {
            cache,
            series,
            ttl,
            base,
            window_months,
        }
    }

    /// The chart. Engine contract violations propagate; provider failures never do.
    pub async fn chart(&self) -> Result<PerformanceReport, EngineError> {
        if let Some(CachedPayload::Performance(payload)) = self.cache.get(CACHE_KEY) {
            debug!("Performance data from cache");
            return Ok(PerformanceReport {
                payload,
                fallback: false,
            });
        }

        let Some(provider) = &self.series else {
            warn!("Series source not configured, serving baseline chart");
            return Ok(self.fallback());
        };

        let today = Utc::now().date_naive();
        let fetched = self.fetch_all(provider, today).await;
        let source = source_label(provider.source.name());

        match build_performance(&fetched, self.base, self.window_months, today, &source)? {
            Some(payload) => {
                info!(
                    "Performance data built: {} points from {} series",
                    payload.data.len(),
                    fetched.len()
                );
                self.cache
                    .set_with_ttl(CACHE_KEY, CachedPayload::Performance(payload.clone()), self.ttl);
                Ok(PerformanceReport {
                    payload,
                    fallback: false,
                })
            }
            None => {
                warn!("No portfolio history available, serving baseline chart");
                Ok(self.fallback())
            }
        }
    }

    fn fallback(&self) -> PerformanceReport {
        PerformanceReport {
            payload: fallback_performance(),
            fallback: true,
        }
    }

    async fn fetch_all(
        &self,
        provider: &Paced<dyn SeriesSource>,
        today: NaiveDate,
    ) -> HashMap<String, Series> {
        let window_start = months_before(today, self.window_months);
        let start = window_start.min(self.base);
        let range = NaiveDate::from_ymd_opt(start.year(), start.month(), 1)
            .map(|first| DateRange::new(first, today));

        let symbols: Vec<&str> = PORTFOLIO
            .iter()
            .map(|(symbol, _)| *symbol)
            .chain(BENCHMARKS)
            .collect();
        let total = symbols.len();
        let mut fetched = HashMap::with_capacity(total);

        info!("Fetching performance history for {} symbols", total);
        for (i, symbol) in symbols.into_iter().enumerate() {
            debug!("Fetching {} ({}/{})", symbol, i + 1, total);
            let mut request = SourceRequest::new(symbol);
            request.range = range;

            match provider.source.fetch_series(&request).await {
                Ok(series) => {
                    fetched.insert(symbol.to_string(), series);
                }
                Err(e) => warn!("Failed to fetch {} ({}): {}", symbol, e.kind().as_str(), e),
            }
            provider.pause_after(i, total).await;
        }

        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::types::TimePoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(s: &str) -> PeriodKey {
        PeriodKey::parse(s).unwrap()
    }

    fn monthly(symbol: &str, values: &[(&str, f64)]) -> Series {
        Series::new(
            symbol,
            values
                .iter()
                .map(|(k, v)| TimePoint::at(key(k), Some(*v)))
                .collect(),
        )
        .unwrap()
    }

    fn fixture() -> HashMap<String, Series> {
        let mut fetched = HashMap::new();
        fetched.insert(
            "NVDA".to_string(),
            monthly("NVDA", &[("2024-01", 100.0), ("2024-02", 110.0), ("2024-03", 120.0)]),
        );
        fetched.insert(
            "ISRG".to_string(),
            monthly("ISRG", &[("2024-01", 50.0), ("2024-03", 40.0)]),
        );
        fetched.insert(
            "SPY".to_string(),
            monthly("SPY", &[("2024-01", 400.0), ("2024-02", 440.0)]),
        );
        fetched
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_build_performance() {
        let payload = build_performance(&fixture(), key("2024-01"), 24, day("2024-04-10"), "test")
            .unwrap()
            .unwrap();

        let robotics: Vec<i64> = payload.data.iter().map(|p| p.robotics).collect();
        // Feb: ISRG missing, NVDA alone. Mar: (0.25 * 120 + 0.20 * 80) / 0.45 = 102.2
        assert_eq!(robotics, vec![100, 110, 102]);

        let sp500: Vec<i64> = payload.data.iter().map(|p| p.sp500).collect();
        assert_eq!(sp500, vec![100, 110, 100]);
        assert!(payload.data.iter().all(|p| p.nasdaq == 100 && p.soxx == 100));

        assert_eq!(payload.data[0].month, "Jan 24");
        assert_eq!(payload.metadata.data_points, 3);
        assert_eq!(payload.metadata.portfolio.len(), 8);
        assert!(payload.metadata.portfolio[0].available);
        assert!(!payload.metadata.portfolio[2].available);
        assert!(payload.metadata.benchmarks[0].available);
        assert!(!payload.metadata.benchmarks[1].available);
    }

    #[test]
    fn test_timeline_follows_first_available_member() {
        let mut fetched = fixture();
        fetched.remove("NVDA");
        let payload = build_performance(&fetched, key("2024-01"), 24, day("2024-04-10"), "test")
            .unwrap()
            .unwrap();
        let dates: Vec<String> = payload.data.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01", "2024-03"]);
        assert_eq!(payload.data[1].robotics, 80);
    }

    #[test]
    fn test_window_drops_old_points() {
        let payload = build_performance(&fixture(), key("2024-01"), 24, day("2026-03-01"), "test")
            .unwrap()
            .unwrap();
        assert_eq!(payload.data.len(), 1);
        assert_eq!(payload.data[0].date, key("2024-03"));
    }

    #[test]
    fn test_benchmarks_only_is_none() {
        let mut fetched = HashMap::new();
        fetched.insert("SPY".to_string(), monthly("SPY", &[("2024-01", 400.0)]));
        assert!(build_performance(&fetched, key("2024-01"), 24, day("2024-04-10"), "test")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let start = months_before(day("2025-06-15"), u32::MAX);
        assert_eq!(start, key("1925-06"));

        let payload = build_performance(&fixture(), key("2024-01"), 1 << 31, day("2024-04-15"), "Yahoo Finance API")
            .unwrap()
            .unwrap();
        assert_eq!(payload.data.len(), 3);
    }

    #[test]
    fn test_fallback_performance() {
        let payload = fallback_performance();
        assert_eq!(payload.data.len(), 9);
        assert_eq!(payload.metadata.data_points, 9);
        assert_eq!(payload.metadata.base_date, key("2024-01"));
        assert_eq!(payload.data[8].robotics, 228);
        assert_eq!(payload.data[8].month, "Dec 25");
        assert_eq!(payload.source, SOURCE_CACHED);
        assert_eq!(payload.metadata.portfolio.len(), PORTFOLIO.len());
        assert_eq!(payload.metadata.benchmarks.len(), BENCHMARKS.len());
        assert!(payload.metadata.portfolio.iter().all(|m| !m.available));
        assert!(payload.metadata.benchmarks.iter().all(|b| !b.available));
    }

    fn json_keys(value: &serde_json::Value) -> Vec<String> {
        let mut keys: Vec<String> = value
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    #[test]
    fn test_fallback_shape_matches_live_chart() {
        let live = build_performance(&fixture(), key("2024-01"), 1_200, day("2024-04-15"), "Yahoo Finance API")
            .unwrap()
            .unwrap();
        assert!(!live.metadata.benchmarks[1].available);
        let fallback = fallback_performance();

        let live = serde_json::to_value(&live).unwrap();
        let fallback = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json_keys(&live), json_keys(&fallback));
        assert_eq!(json_keys(&live["metadata"]), json_keys(&fallback["metadata"]));
        assert_eq!(json_keys(&live["data"][0]), json_keys(&fallback["data"][0]));

        let symbols = |v: &serde_json::Value, field: &str| -> Vec<String> {
            v["metadata"][field]
                .as_array()
                .unwrap()
                .iter()
                .map(|m| m["symbol"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(symbols(&live, "portfolio"), symbols(&fallback, "portfolio"));
        assert_eq!(symbols(&live, "benchmarks"), symbols(&fallback, "benchmarks"));
    }

    struct MockSeries {
        calls: AtomicUsize,
        available: HashMap<String, Series>,
    }

    #[async_trait]
    impl SeriesSource for MockSeries {
        fn name(&self) -> &'static str {
            "yahoo"
        }

        async fn fetch_series(&self, request: &SourceRequest) -> Result<Series, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.range.is_some());
            self.available
                .get(&request.query)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(request.query.clone()))
        }
    }

    fn service(available: HashMap<String, Series>) -> (PerformanceService, Arc<MockSeries>, Arc<ResponseCache>) {
        let source = Arc::new(MockSeries {
            calls: AtomicUsize::new(0),
            available,
        });
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300)));
        let service = PerformanceService::new(
            cache.clone(),
            Some(Paced::new(source.clone() as Arc<dyn SeriesSource>, Duration::ZERO)),
            Duration::from_secs(86_400),
            key("2024-01"),
            // wide enough that the fixture is never clipped
            1_200,
        );
        (service, source, cache)
    }

    #[tokio::test]
    async fn test_chart_cached_after_success() {
        let (service, source, cache) = service(fixture());

        let first = service.chart().await.unwrap();
        assert!(!first.fallback);
        assert_eq!(first.payload.source, "Yahoo Finance API");
        assert_eq!(source.calls.load(Ordering::SeqCst), 12);
        assert!(cache.contains(CACHE_KEY));

        let second = service.chart().await.unwrap();
        assert_eq!(second.payload, first.payload);
        assert_eq!(source.calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_fallback_not_cached() {
        let (service, source, cache) = service(HashMap::new());

        let report = service.chart().await.unwrap();
        assert!(report.fallback);
        assert_eq!(report.payload.source, SOURCE_CACHED);
        assert!(!cache.contains(CACHE_KEY));

        service.chart().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 24);
    }
}
