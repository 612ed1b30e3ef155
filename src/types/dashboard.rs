//! Reference datasets served to the dashboard as-is.

use serde::{Deserialize, Serialize};

/// Robotics market segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub name: String,
    /// Percent, year over year.
    pub growth: i64,
    /// Billions of USD.
    pub market_size: f64,
    pub momentum: u8,
    pub color: String,
    pub companies: Vec<String>,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortageLevel {
    Low,
    Medium,
    Critical,
}

/// Supply-chain component risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyComponent {
    pub id: String,
    pub name: String,
    pub suppliers: Vec<String>,
    /// Top-three supplier share, percent.
    pub concentration: u8,
    /// Weeks.
    pub lead_time: u32,
    pub criticality: u8,
    /// Percent.
    pub price_change: i64,
    pub shortage: ShortageLevel,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: AlertPriority,
    pub title: String,
    pub time: String,
    pub read: bool,
}

/// Provenance notes for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceNote {
    pub dataset: String,
    pub source: String,
    pub definition: String,
    pub revision_policy: String,
}
