//! Leading-indicator records produced for the dashboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provenance tag used for static substitutes.
pub const SOURCE_CACHED: &str = "Cached";
/// Provenance tag for signals that have no live provider.
pub const SOURCE_SIMULATED: &str = "Simulated";

/// The leading indicators, in the order the dashboard lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    PatentMomentum,
    HiringVelocity,
    OrderBookStrength,
    PolicyTailwinds,
    EarningsSentiment,
    SupplyChainEasing,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        Self::PatentMomentum,
        Self::HiringVelocity,
        Self::OrderBookStrength,
        Self::PolicyTailwinds,
        Self::EarningsSentiment,
        Self::SupplyChainEasing,
    ];

    /// URL segment under `/api/signals`.
    pub fn from_slug(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "patents" | "patent" => Some(Self::PatentMomentum),
            "hiring" | "jobs" => Some(Self::HiringVelocity),
            "orders" | "order-book" => Some(Self::OrderBookStrength),
            "policy" => Some(Self::PolicyTailwinds),
            "earnings" => Some(Self::EarningsSentiment),
            "supply" | "supply-chain" => Some(Self::SupplyChainEasing),
            _ => None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PatentMomentum => "Patent Momentum",
            Self::HiringVelocity => "Hiring Velocity",
            Self::OrderBookStrength => "Order Book Strength",
            Self::PolicyTailwinds => "Policy Tailwinds",
            Self::EarningsSentiment => "Earnings Sentiment",
            Self::SupplyChainEasing => "Supply Chain Easing",
        }
    }

    /// Cache key of the single-signal run.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Self::PatentMomentum => "patent_momentum",
            Self::HiringVelocity => "hiring_velocity",
            Self::OrderBookStrength => "order_book_strength",
            Self::PolicyTailwinds => "policy_tailwinds",
            Self::EarningsSentiment => "earnings_sentiment",
            Self::SupplyChainEasing => "supply_chain_easing",
        }
    }
}

/// Open label -> number breakdown of a signal. Shape varies per indicator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Factors(BTreeMap<String, f64>);

impl Factors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: &str, value: f64) -> Self {
        self.0.insert(label.to_string(), value);
        self
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys must be non-empty and values finite.
    pub fn is_valid(&self) -> bool {
        self.0
            .iter()
            .all(|(label, value)| !label.trim().is_empty() && value.is_finite())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for Factors {
    fn from(entries: [(&str, f64); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
        )
    }
}

/// Supporting item shown under a signal (article, job posting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A 0-100 leading indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSignal {
    pub name: String,
    pub value: u8,
    pub change: i64,
    pub factors: Factors,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_points: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
    /// Reason the slot was degraded, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndicatorSignal {
    pub fn new(
        kind: SignalKind,
        value: i64,
        change: i64,
        factors: Factors,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: kind.name().to_string(),
            value: value.clamp(0, 100) as u8,
            change,
            factors,
            description: description.into(),
            source: None,
            data_points: None,
            highlights: Vec::new(),
            error: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_data_points(mut self, data_points: u64) -> Self {
        self.data_points = Some(data_points);
        self
    }

    pub fn with_highlights(mut self, highlights: Vec<Highlight>) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Whether this slot holds a static substitute.
    pub fn is_fallback(&self) -> bool {
        self.source.as_deref() == Some(SOURCE_CACHED)
    }
}
