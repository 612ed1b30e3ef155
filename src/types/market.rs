//! Flat records returned by the point-quote and count adapters.

use serde::{Deserialize, Serialize};

/// Company profile fields reported alongside a quote. All optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    /// USD.
    pub revenue_ttm: Option<f64>,
    /// Fraction, e.g. 0.12 for 12 %.
    pub quarterly_revenue_growth_yoy: Option<f64>,
    /// Fraction.
    pub profit_margin: Option<f64>,
    pub pe_ratio: Option<f64>,
}

/// Point-in-time quote for one symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
    /// USD.
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub profile: CompanyProfile,
}

/// One counted item (patent grant, article, job posting).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountItem {
    /// `YYYY-MM-DD` or a full ISO timestamp.
    pub date: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    /// Secondary text: article description, employer.
    pub detail: Option<String>,
    pub url: Option<String>,
}

impl CountItem {
    /// Lowercased title and detail, for keyword matching.
    pub fn text(&self) -> String {
        let mut text = self.title.clone().unwrap_or_default();
        if let Some(detail) = &self.detail {
            text.push(' ');
            text.push_str(detail);
        }
        text.to_lowercase()
    }

    /// Calendar date of the item, if it has a parsable one.
    pub fn day(&self) -> Option<chrono::NaiveDate> {
        let date = self.date.as_deref()?;
        chrono::NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()
    }
}

/// Result of a count query: the provider's total plus the returned page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Count {
    pub count: u64,
    pub items: Vec<CountItem>,
}
