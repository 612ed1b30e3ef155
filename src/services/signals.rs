//! Leading-indicator signals.
//!
//! Each signal is computed from one provider run and cached on success. A failed run
//! returns the signal's static substitute for this request only; substitutes are never
//! cached so a transient outage does not stick for the whole TTL.
//!
//! The scoring formulas are heuristic blends of raw provider metrics. They are
//! deterministic; the coefficients are tuning constants, not derived quantities.

use chrono::{Months, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::{CachedPayload, ResponseCache};
use super::index::round_half_up;
use super::pacing::{pause_between, Paced};
use crate::error::ProviderUnavailable;
use crate::sources::{CountSource, QuoteSource, SourceRequest};
use crate::types::{
    Count, DateRange, Factors, Highlight, IndicatorSignal, Quote, SignalKind, SOURCE_CACHED,
    SOURCE_SIMULATED,
};

const PATENT_QUERY: &str = r#"robotics OR automation OR "artificial intelligence""#;
const PATENT_ROWS: u32 = 1000;
const JOBS_QUERY: &str = "robotics OR automation engineer";
const JOBS_RESULTS: u32 = 50;
const POLICY_QUERY: &str = "robotics AND (subsidy OR government OR policy OR incentive)";
const POLICY_ARTICLES: u32 = 50;
const ORDER_BOOK_PROXY: &str = "ROK";
const EARNINGS_TICKERS: [&str; 3] = ["NVDA", "ISRG", "ROK"];
const HIGHLIGHTS: usize = 5;

fn round(value: f64) -> i64 {
    round_half_up(value) as i64
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_half_up(part as f64 / total as f64 * 100.0)
    }
}

/// Providers feeding the signals. `None` means the credentials are not configured.
#[derive(Clone, Default)]
pub struct SignalProviders {
    pub patents: Option<Paced<dyn CountSource>>,
    pub jobs: Option<Paced<dyn CountSource>>,
    pub news: Option<Paced<dyn CountSource>>,
    pub fundamentals: Option<Paced<dyn QuoteSource>>,
}

/// Result of the "all signals" run.
#[derive(Debug, Clone)]
pub struct SignalSnapshot {
    pub signals: Vec<IndicatorSignal>,
    /// True when any slot holds a static substitute.
    pub cached: bool,
}

pub struct SignalService {
    cache: Arc<ResponseCache>,
    providers: SignalProviders,
    ttl: Duration,
    /// Last live value per signal, for the change of signals without a trend input.
    last_observed: DashMap<SignalKind, u8>,
}

impl SignalService {
    pub fn new(cache: Arc<ResponseCache>, providers: SignalProviders, ttl: Duration) -> Self {
        Self {
            cache,
            providers,
            ttl,
            last_observed: DashMap::new(),
        }
    }

    /// One signal: cached value, fresh value, or its substitute.
    pub async fn get(&self, kind: SignalKind) -> IndicatorSignal {
        self.resolve(kind).await.0
    }

    /// Every signal in declared order, one run after the other.
    pub async fn all(&self) -> SignalSnapshot {
        let total = SignalKind::ALL.len();
        let mut signals = Vec::with_capacity(total);

        for (i, kind) in SignalKind::ALL.into_iter().enumerate() {
            let (signal, fetched) = self.resolve(kind).await;
            signals.push(signal);
            if fetched && self.calls_remain(i) {
                pause_between(i, total, self.gap_for(kind)).await;
            }
        }

        let degraded = signals.iter().filter(|s| s.is_fallback()).count();
        info!(
            "Signals run complete: {} live, {} substituted",
            total - degraded,
            degraded
        );

        SignalSnapshot {
            signals,
            cached: degraded > 0,
        }
    }

    /// Whether any slot after `index` still goes to a provider.
    fn calls_remain(&self, index: usize) -> bool {
        SignalKind::ALL
            .iter()
            .skip(index + 1)
            .any(|kind| *kind != SignalKind::SupplyChainEasing)
    }

    /// Returns the signal and whether it missed the cache.
    async fn resolve(&self, kind: SignalKind) -> (IndicatorSignal, bool) {
        if kind == SignalKind::SupplyChainEasing {
            return (supply_chain_signal(), false);
        }

        if let Some(CachedPayload::Signal(signal)) = self.cache.get(kind.cache_key()) {
            debug!("{} from cache", kind.name());
            return (signal, false);
        }

        match self.compute(kind).await.and_then(|signal| validated(kind, signal)) {
            Ok(signal) => {
                self.cache
                    .set_with_ttl(kind.cache_key(), CachedPayload::Signal(signal.clone()), self.ttl);
                (signal, true)
            }
            Err(unavailable) => {
                warn!(
                    "{} degraded to substitute ({}): {}",
                    kind.name(),
                    unavailable.kind.map(|k| k.as_str()).unwrap_or("not_configured"),
                    unavailable
                );
                (fallback_signal(kind).with_error(unavailable.to_string()), true)
            }
        }
    }

    async fn compute(&self, kind: SignalKind) -> Result<IndicatorSignal, ProviderUnavailable> {
        let today = Utc::now().date_naive();
        match kind {
            SignalKind::PatentMomentum => {
                let provider = configured(&self.providers.patents, "uspto")?;
                let request = SourceRequest::new(PATENT_QUERY)
                    .with_range(DateRange::trailing_months(today, 12))
                    .with_limit(PATENT_ROWS);
                let count = fetch_count(provider, &request).await?;
                Ok(patent_signal(&count, today))
            }
            SignalKind::HiringVelocity => {
                let provider = configured(&self.providers.jobs, "adzuna")?;
                let request = SourceRequest::new(JOBS_QUERY).with_limit(JOBS_RESULTS);
                let count = fetch_count(provider, &request).await?;
                let mut signal = hiring_signal(&count);
                signal.change = self.observe(kind, signal.value);
                Ok(signal)
            }
            SignalKind::OrderBookStrength => {
                let provider = configured(&self.providers.fundamentals, "alphavantage")?;
                let quote = provider
                    .source
                    .fetch_quote(&SourceRequest::new(ORDER_BOOK_PROXY))
                    .await
                    .map_err(|e| ProviderUnavailable::new(provider.source.name(), &e))?;
                Ok(order_book_signal(&quote))
            }
            SignalKind::PolicyTailwinds => {
                let provider = configured(&self.providers.news, "newsapi")?;
                let request = SourceRequest::new(POLICY_QUERY)
                    .with_range(DateRange::trailing_months(today, 1))
                    .with_limit(POLICY_ARTICLES);
                let count = fetch_count(provider, &request).await?;
                Ok(policy_signal(&count))
            }
            SignalKind::EarningsSentiment => {
                let provider = configured(&self.providers.fundamentals, "alphavantage")?;
                let scores = self.earnings_scores(provider).await;
                if scores.is_empty() {
                    return Err(ProviderUnavailable::exhausted(
                        provider.source.name(),
                        EARNINGS_TICKERS.len(),
                    ));
                }
                let mut signal = earnings_signal(&scores);
                signal.change = self.observe(kind, signal.value);
                Ok(signal)
            }
            SignalKind::SupplyChainEasing => Ok(supply_chain_signal()),
        }
    }

    async fn earnings_scores(&self, provider: &Paced<dyn QuoteSource>) -> Vec<f64> {
        let total = EARNINGS_TICKERS.len();
        let mut scores = Vec::with_capacity(total);

        for (i, ticker) in EARNINGS_TICKERS.iter().enumerate() {
            debug!("Fetching {} overview ({}/{})", ticker, i + 1, total);
            match provider.source.fetch_quote(&SourceRequest::new(*ticker)).await {
                Ok(quote) => scores.push(earnings_score(&quote)),
                Err(e) => warn!("Earnings: {} failed ({}): {}", ticker, e.kind().as_str(), e),
            }
            provider.pause_after(i, total).await;
        }

        scores
    }

    /// Record a live value and return its difference from the previous one.
    fn observe(&self, kind: SignalKind, value: u8) -> i64 {
        let previous = self.last_observed.insert(kind, value);
        previous.map_or(0, |p| value as i64 - p as i64)
    }

    /// Gap owed to the provider behind `kind` after a run. Zero when unconfigured.
    fn gap_for(&self, kind: SignalKind) -> Duration {
        match kind {
            SignalKind::PatentMomentum => gap_of(&self.providers.patents),
            SignalKind::HiringVelocity => gap_of(&self.providers.jobs),
            SignalKind::PolicyTailwinds => gap_of(&self.providers.news),
            SignalKind::OrderBookStrength | SignalKind::EarningsSentiment => {
                gap_of(&self.providers.fundamentals)
            }
            SignalKind::SupplyChainEasing => Duration::ZERO,
        }
    }
}

fn provider_of(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::PatentMomentum => "uspto",
        SignalKind::HiringVelocity => "adzuna",
        SignalKind::PolicyTailwinds => "newsapi",
        SignalKind::OrderBookStrength | SignalKind::EarningsSentiment => "alphavantage",
        SignalKind::SupplyChainEasing => "simulated",
    }
}

/// Factor labels must be non-empty and values finite before a signal is cached or served.
fn validated(kind: SignalKind, signal: IndicatorSignal) -> Result<IndicatorSignal, ProviderUnavailable> {
    if signal.factors.is_valid() {
        Ok(signal)
    } else {
        Err(ProviderUnavailable::invalid(
            provider_of(kind),
            "invalid factors: empty label or non-finite value",
        ))
    }
}

fn gap_of<S: ?Sized>(provider: &Option<Paced<S>>) -> Duration {
    provider.as_ref().map_or(Duration::ZERO, |p| p.gap)
}

fn configured<'a, S: ?Sized>(
    provider: &'a Option<Paced<S>>,
    name: &'static str,
) -> Result<&'a Paced<S>, ProviderUnavailable> {
    provider
        .as_ref()
        .ok_or_else(|| ProviderUnavailable::not_configured(name))
}

async fn fetch_count(
    provider: &Paced<dyn CountSource>,
    request: &SourceRequest,
) -> Result<Count, ProviderUnavailable> {
    provider
        .source
        .fetch_count(request)
        .await
        .map_err(|e| ProviderUnavailable::new(provider.source.name(), &e))
}

/// Filings in the last three months against the run rate of the nine before.
pub fn patent_signal(count: &Count, today: NaiveDate) -> IndicatorSignal {
    let cutoff = today.checked_sub_months(Months::new(3)).unwrap_or(today);
    let recent = count
        .items
        .iter()
        .filter(|item| item.day().is_some_and(|d| d >= cutoff))
        .count();
    let older = count.items.len() - recent;

    let growth = if older > 0 {
        recent as f64 / (older as f64 / 3.0)
    } else {
        1.0
    };
    let value = round(50.0 + (growth - 1.0) * 100.0).clamp(0, 100);
    let change = round((growth - 1.0) * 50.0);
    let v = value as f64;

    let factors = Factors::from([
        ("humanoid", round_half_up(v * 0.35)),
        ("perception", round_half_up(v * 0.25)),
        ("actuation", round_half_up(v * 0.20)),
        ("safety", round_half_up(v * 0.10)),
        ("other", round_half_up(v * 0.10)),
    ]);

    IndicatorSignal::new(
        SignalKind::PatentMomentum,
        value,
        change,
        factors,
        "USPTO robotics patent filings velocity",
    )
    .with_data_points(count.items.len() as u64)
    .with_source("USPTO PEDS API")
}

/// Posting volume on a log scale. `change` is left at 0 for the caller to fill.
pub fn hiring_signal(count: &Count) -> IndicatorSignal {
    let value = round(50.0 + ((count.count + 1) as f64).ln() * 10.0).min(100);

    let (mut software, mut controls, mut perception, mut safety) = (0, 0, 0, 0);
    for job in &count.items {
        let title = job.title.as_deref().unwrap_or_default().to_lowercase();
        if title.contains("software") || title.contains("ai") || title.contains("ml") {
            software += 1;
        } else if title.contains("control") || title.contains("embedded") {
            controls += 1;
        } else if title.contains("vision") || title.contains("perception") || title.contains("sensor") {
            perception += 1;
        } else if title.contains("safety") {
            safety += 1;
        }
    }

    let jobs = count.items.len();
    let or_default = |n: usize, default: f64| match share(n, jobs) {
        s if s == 0.0 => default,
        s => s,
    };
    let factors = Factors::from([
        ("software", or_default(software, 40.0)),
        ("controls", or_default(controls, 25.0)),
        ("perception", or_default(perception, 20.0)),
        ("safety", or_default(safety, 15.0)),
    ]);

    let highlights = count
        .items
        .iter()
        .take(HIGHLIGHTS)
        .map(|job| Highlight {
            title: job.title.clone().unwrap_or_default(),
            detail: job.detail.clone(),
            date: job.date.clone(),
            url: job.url.clone(),
        })
        .collect();

    IndicatorSignal::new(
        SignalKind::HiringVelocity,
        value,
        0,
        factors,
        "Robotics job postings growth rate",
    )
    .with_data_points(count.count)
    .with_highlights(highlights)
    .with_source("Adzuna API")
}

/// Revenue growth of an automation bellwether as an orders proxy.
pub fn order_book_signal(quote: &Quote) -> IndicatorSignal {
    let growth = quote.profile.quarterly_revenue_growth_yoy.unwrap_or(0.0);
    let strength = (50.0 + growth * 5.0).clamp(30.0, 100.0);

    IndicatorSignal::new(
        SignalKind::OrderBookStrength,
        round(strength),
        round(growth * 2.0),
        order_book_factors(),
        "Automation capex + robot orders proxy",
    )
    .with_source("Alpha Vantage API")
}

fn order_book_factors() -> Factors {
    Factors::from([
        ("warehouse", 35.0),
        ("industrial", 30.0),
        ("cobot", 20.0),
        ("other", 15.0),
    ])
}

/// Keyword counts over recent policy news.
pub fn policy_signal(count: &Count) -> IndicatorSignal {
    let (mut positive, mut subsidies, mut reshoring, mut defense) = (0usize, 0usize, 0usize, 0usize);

    for article in &count.items {
        let text = article.text();
        if text.contains("subsidy") || text.contains("funding") || text.contains("grant") {
            positive += 1;
            subsidies += 1;
        }
        if text.contains("reshoring") || text.contains("domestic") || text.contains("local production") {
            positive += 1;
            reshoring += 1;
        }
        if text.contains("defense") || text.contains("military") || text.contains("security") {
            defense += 1;
        }
        if text.contains("boost") || text.contains("support") || text.contains("encourage") {
            positive += 1;
        }
    }

    let articles = count.items.len();
    let total = articles.max(1) as f64;
    let positive_ratio = positive as f64 / total;
    let value = round(40.0 + positive_ratio * 60.0 + total * 0.5).min(100);
    let change = round(total * 0.3).min(30);

    let pct = |n: f64| round_half_up(n / total * 100.0);
    let factors = Factors::from([
        ("subsidies", pct(subsidies as f64)),
        ("reshoring", pct(reshoring as f64)),
        ("defense", pct(defense as f64)),
        (
            "other",
            pct(total - subsidies as f64 - reshoring as f64 - defense as f64),
        ),
    ]);

    let highlights = count
        .items
        .iter()
        .take(HIGHLIGHTS)
        .map(|article| Highlight {
            title: article.title.clone().unwrap_or_default(),
            detail: article.category.clone(),
            date: article.date.clone(),
            url: article.url.clone(),
        })
        .collect();

    IndicatorSignal::new(
        SignalKind::PolicyTailwinds,
        value,
        change,
        factors,
        "Government incentives + procurement signals from news",
    )
    .with_data_points(articles as u64)
    .with_highlights(highlights)
    .with_source("NewsAPI")
}

/// Sentiment of one company from growth, margin and valuation. Missing inputs count as 0.
pub fn earnings_score(quote: &Quote) -> f64 {
    let profile = &quote.profile;
    let growth = profile.quarterly_revenue_growth_yoy.unwrap_or(0.0);
    let margin = profile.profit_margin.unwrap_or(0.0);
    let pe = profile.pe_ratio.unwrap_or(0.0);
    (50.0 + growth * 2.0 + margin * 100.0 - (pe - 25.0) * 0.5).clamp(0.0, 100.0)
}

/// Average of per-company scores. `change` is left at 0 for the caller to fill.
pub fn earnings_signal(scores: &[f64]) -> IndicatorSignal {
    let average = scores.iter().sum::<f64>() / scores.len().max(1) as f64;
    // Non-finite inputs stay non-finite here so validation catches them.
    let v = round_half_up(average);
    let value = v as i64;

    IndicatorSignal::new(
        SignalKind::EarningsSentiment,
        value,
        0,
        Factors::from([
            ("mentions", round_half_up(v * 0.4)),
            ("tone", round_half_up(v * 0.35)),
            ("guidance", round_half_up(v * 0.25)),
        ]),
        "Financial metrics analysis from earnings data",
    )
    .with_data_points(scores.len() as u64)
    .with_source("Alpha Vantage API")
}

/// Component availability. There is no free provider for it.
pub fn supply_chain_signal() -> IndicatorSignal {
    IndicatorSignal::new(
        SignalKind::SupplyChainEasing,
        58,
        -5,
        Factors::from([
            ("chips", 30.0),
            ("harmonic", -20.0),
            ("sensors", 15.0),
            ("other", 15.0),
        ]),
        "Component availability index (simulated)",
    )
    .with_source(SOURCE_SIMULATED)
}

/// Static substitute served when a signal's provider is unavailable.
pub fn fallback_signal(kind: SignalKind) -> IndicatorSignal {
    let signal = match kind {
        SignalKind::PatentMomentum => IndicatorSignal::new(
            kind,
            82,
            12,
            Factors::from([
                ("humanoid", 35.0),
                ("perception", 25.0),
                ("actuation", 20.0),
                ("safety", 10.0),
                ("other", 10.0),
            ]),
            "USPTO robotics patent filings velocity (cached)",
        ),
        SignalKind::HiringVelocity => IndicatorSignal::new(
            kind,
            78,
            8,
            Factors::from([
                ("software", 40.0),
                ("controls", 25.0),
                ("perception", 20.0),
                ("safety", 15.0),
            ]),
            "Robotics job postings growth rate (cached)",
        ),
        SignalKind::OrderBookStrength => IndicatorSignal::new(
            kind,
            71,
            5,
            order_book_factors(),
            "Automation capex + robot orders proxy (cached)",
        ),
        SignalKind::PolicyTailwinds => IndicatorSignal::new(
            kind,
            85,
            15,
            Factors::from([
                ("subsidies", 45.0),
                ("reshoring", 30.0),
                ("defense", 15.0),
                ("other", 10.0),
            ]),
            "Government incentives + procurement (cached)",
        ),
        SignalKind::EarningsSentiment => IndicatorSignal::new(
            kind,
            74,
            6,
            Factors::from([("mentions", 40.0), ("tone", 35.0), ("guidance", 25.0)]),
            "Financial metrics analysis (cached)",
        ),
        SignalKind::SupplyChainEasing => return supply_chain_signal(),
    };
    signal.with_source(SOURCE_CACHED)
}
