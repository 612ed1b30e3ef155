//! Company fundamentals for the tracked universe.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::{CachedPayload, ResponseCache};
use super::index::round_half_up;
use super::now_iso;
use super::pacing::Paced;
use crate::sources::{source_label, QuoteSource, SourceRequest};
use crate::types::{
    CompaniesPayload, CompanyProfile, CompanyRecord, FetchStats, Quote, Tier, SOURCE_CACHED,
};

pub const CACHE_KEY: &str = "all_companies";

/// Fetched in this order.
pub const TRACKED_TICKERS: [&str; 8] = ["NVDA", "ISRG", "ROK", "ABB", "FANUY", "SYM", "PATH", "TSLA"];

fn round_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// Known pure plays have a fixed exposure score.
fn pure_play_exposure(ticker: &str) -> Option<u8> {
    match ticker {
        "ISRG" => Some(95),
        "SYM" => Some(100),
        "ABB" => Some(48),
        "FANUY" => Some(88),
        "ROK" => Some(58),
        _ => None,
    }
}

/// Robotics exposure, 20..=100.
pub fn exposure_score(ticker: &str, profile: &CompanyProfile) -> u8 {
    if let Some(score) = pure_play_exposure(ticker) {
        return score;
    }

    let industry = profile.industry.as_deref().unwrap_or_default().to_lowercase();
    let description = profile.description.as_deref().unwrap_or_default().to_lowercase();

    let mut score = 0u32;
    if industry.contains("robot") || industry.contains("automation") {
        score += 40;
    }
    if industry.contains("semiconductor") && description.contains("ai") {
        score += 35;
    }
    if description.contains("robot") {
        score += 30;
    }
    if description.contains("automation") {
        score += 25;
    }
    if description.contains("ai") || description.contains("artificial intelligence") {
        score += 20;
    }

    score.clamp(20, 100) as u8
}

/// Momentum from growth and margin (both in percent) and valuation, 30..=100.
pub fn momentum_score(revenue_growth: f64, profit_margin: f64, pe_ratio: Option<f64>) -> u8 {
    let mut momentum = 50.0;
    momentum += (revenue_growth * 0.3).min(30.0);
    momentum += (profit_margin * 0.4).min(20.0);

    if let Some(pe) = pe_ratio.filter(|pe| *pe > 0.0 && *pe < 100.0) {
        if pe < 20.0 {
            momentum += 10.0;
        } else if pe > 50.0 {
            momentum -= 10.0;
        }
    }

    round_half_up(momentum).clamp(30.0, 100.0) as u8
}

pub fn segments(ticker: &str) -> Vec<String> {
    let segments: &[&str] = match ticker {
        "NVDA" => &["humanoid", "warehouse", "surgical"],
        "ISRG" => &["surgical"],
        "ABB" | "FANUY" | "ROK" => &["cobot", "industrial"],
        "SYM" => &["warehouse"],
        "TSLA" => &["humanoid"],
        _ => &[],
    };
    segments.iter().map(|s| s.to_string()).collect()
}

/// Build a record from a live quote.
pub fn company_record(ticker: &str, quote: &Quote, source: &str, updated: &str) -> CompanyRecord {
    let profile = &quote.profile;
    let revenue_growth = profile.quarterly_revenue_growth_yoy.unwrap_or(0.0) * 100.0;
    let profit_margin = profile.profit_margin.unwrap_or(0.0) * 100.0;
    let exposure = exposure_score(ticker, profile);

    CompanyRecord {
        ticker: ticker.to_string(),
        name: quote.name.clone().unwrap_or_else(|| ticker.to_string()),
        market_cap: round_tenth(quote.market_cap.unwrap_or(0.0) / 1e9),
        revenue: round_tenth(profile.revenue_ttm.unwrap_or(0.0) / 1e9),
        revenue_growth: round_half_up(revenue_growth) as i64,
        exposure,
        momentum: momentum_score(revenue_growth, profit_margin, profile.pe_ratio),
        segments: segments(ticker),
        tier: Tier::from_exposure(exposure),
        sector: profile.sector.clone(),
        industry: profile.industry.clone(),
        pe_ratio: profile.pe_ratio,
        profit_margin: Some(round_tenth(profit_margin)),
        source: source.to_string(),
        last_updated: updated.to_string(),
    }
}

/// Static record served for a ticker whose fetch failed.
pub fn fallback_company(ticker: &str, updated: &str) -> CompanyRecord {
    let (name, market_cap, revenue, revenue_growth, exposure, momentum, tier) = match ticker {
        "NVDA" => ("NVIDIA", 4200.0, 187.1, 94, 38, 94, Tier::Core),
        "ISRG" => ("Intuitive Surgical", 200.0, 9.6, 16, 95, 86, Tier::Core),
        "ABB" => ("ABB Ltd", 134.0, 34.5, 10, 48, 70, Tier::Satellite),
        "FANUY" => ("Fanuc Corp", 34.0, 5.3, 6, 88, 62, Tier::Satellite),
        "ROK" => ("Rockwell Automation", 45.0, 8.3, 12, 58, 68, Tier::Core),
        "SYM" => ("Symbotic", 7.0, 2.4, 72, 100, 90, Tier::Speculative),
        "PATH" => ("UiPath", 8.5, 1.4, 18, 72, 65, Tier::Satellite),
        "TSLA" => ("Tesla (Optimus)", 1600.0, 95.6, 22, 28, 82, Tier::Satellite),
        _ => (ticker, 0.0, 0.0, 0, 20, 50, Tier::Speculative),
    };

    CompanyRecord {
        ticker: ticker.to_string(),
        name: name.to_string(),
        market_cap,
        revenue,
        revenue_growth,
        exposure,
        momentum,
        segments: segments(ticker),
        tier,
        sector: None,
        industry: None,
        pe_ratio: None,
        profit_margin: None,
        source: SOURCE_CACHED.to_string(),
        last_updated: updated.to_string(),
    }
}

pub struct CompanyService {
    cache: Arc<ResponseCache>,
    quotes: Option<Paced<dyn QuoteSource>>,
    ttl: Duration,
}

impl CompanyService {
    pub fn new(
        cache: Arc<ResponseCache>,
        quotes: Option<Paced<dyn QuoteSource>>,
        ttl: Duration,
    ) -> Self {
        Self { cache, quotes, ttl }
    }

    /// Every tracked company. Always returns all of them; failed fetches are substituted.
    pub async fn all(&self) -> CompaniesPayload {
        if let Some(CachedPayload::Companies(cached)) = self.cache.get(CACHE_KEY) {
            debug!("Companies data from cache");
            return CompaniesPayload {
                companies: cached.companies,
                cached: true,
                last_updated: cached.last_updated,
                stats: None,
            };
        }

        let total = TRACKED_TICKERS.len();
        let mut companies = Vec::with_capacity(total);
        let mut success = 0;

        match &self.quotes {
            Some(provider) => {
                info!("Fetching company data for {} tickers", total);
                let source = source_label(provider.source.name());

                for (i, ticker) in TRACKED_TICKERS.iter().enumerate() {
                    debug!("Fetching {} ({}/{})", ticker, i + 1, total);
                    let updated = now_iso();
                    match provider.source.fetch_quote(&SourceRequest::new(*ticker)).await {
                        Ok(quote) => {
                            companies.push(company_record(ticker, &quote, &source, &updated));
                            success += 1;
                        }
                        Err(e) => {
                            warn!("Failed to fetch {} ({}): {}", ticker, e.kind().as_str(), e);
                            companies.push(fallback_company(ticker, &updated));
                        }
                    }
                    provider.pause_after(i, total).await;
                }
            }
            None => {
                warn!("Company quotes not configured, serving substitutes");
                let updated = now_iso();
                companies.extend(TRACKED_TICKERS.iter().map(|t| fallback_company(t, &updated)));
            }
        }

        let payload = CompaniesPayload {
            companies,
            cached: false,
            last_updated: now_iso(),
            stats: Some(FetchStats {
                total,
                success,
                failed: total - success,
            }),
        };

        self.cache
            .set_with_ttl(CACHE_KEY, CachedPayload::Companies(payload.clone()), self.ttl);
        info!(
            "Companies data fetched: {} live, {} substituted",
            success,
            total - success
        );

        payload
    }
}
