//! Company fundamentals records.

use serde::{Deserialize, Serialize};

/// Portfolio tier derived from robotics exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Core,
    Satellite,
    Speculative,
}

impl Tier {
    pub fn from_exposure(exposure: u8) -> Self {
        if exposure >= 80 {
            Self::Core
        } else if exposure >= 50 {
            Self::Satellite
        } else {
            Self::Speculative
        }
    }
}

/// One tracked company as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub ticker: String,
    pub name: String,
    /// Billions of USD.
    pub market_cap: f64,
    /// Trailing twelve months, billions of USD.
    pub revenue: f64,
    /// Percent, year over year.
    pub revenue_growth: i64,
    pub exposure: u8,
    pub momentum: u8,
    pub segments: Vec<String>,
    pub tier: Tier,
    /// Profile fields are null on substituted records.
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub pe_ratio: Option<f64>,
    pub profit_margin: Option<f64>,
    pub source: String,
    pub last_updated: String,
}

/// Outcome counts of one companies run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// The "companies" aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompaniesPayload {
    pub companies: Vec<CompanyRecord>,
    pub cached: bool,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FetchStats>,
}
