//! Indexed performance chart payload.

use serde::{Deserialize, Serialize};

use super::series::PeriodKey;

/// One month of the chart. Every value is an index (100 at the base period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub month: String,
    pub date: PeriodKey,
    pub robotics: i64,
    pub sp500: i64,
    pub nasdaq: i64,
    pub soxx: i64,
    pub industrials: i64,
}

/// Portfolio member as reported in the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMember {
    pub symbol: String,
    pub weight: f64,
    pub available: bool,
}

/// Benchmark as reported in the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStatus {
    pub symbol: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetadata {
    pub base_date: PeriodKey,
    pub data_points: usize,
    /// Every member, live or not. Missing members are flagged, never dropped.
    pub portfolio: Vec<PortfolioMember>,
    pub benchmarks: Vec<BenchmarkStatus>,
    pub last_updated: String,
}

/// The "performance" aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePayload {
    pub data: Vec<PerformancePoint>,
    pub metadata: PerformanceMetadata,
    pub source: String,
}
