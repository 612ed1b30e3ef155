//! Time series primitives shared by the adapters and the index engine.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Calendar month used to align series from different providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidDateKey(format!("{:04}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Parse `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidDateKey(s.to_string());
        let trimmed = s.trim();
        if trimmed.len() == 10 {
            let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?;
            return Ok(Self::from_date(date));
        }

        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Period containing the given epoch second (UTC).
    pub fn from_timestamp(timestamp: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| Self::from_date(dt.date_naive()))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the period at midnight UTC, in epoch seconds.
    pub fn start_timestamp(&self) -> i64 {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .map(|dt| dt.timestamp())
            .unwrap_or_default()
    }

    /// Shift by a signed number of months.
    pub fn offset_months(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Short display label, e.g. `Jan 24`.
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %y").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PeriodKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// One observation of a raw metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Epoch seconds.
    pub timestamp: i64,
    /// `None` is a gap, never zero.
    pub value: Option<f64>,
}

impl TimePoint {
    pub fn new(timestamp: i64, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    /// Point at the start of a period.
    pub fn at(period: PeriodKey, value: Option<f64>) -> Self {
        Self::new(period.start_timestamp(), value)
    }

    pub fn period(&self) -> Option<PeriodKey> {
        PeriodKey::from_timestamp(self.timestamp)
    }
}

/// Inclusive date range for provider queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `months` months ending today.
    pub fn trailing_months(today: NaiveDate, months: u32) -> Self {
        let start = today
            .checked_sub_months(chrono::Months::new(months))
            .unwrap_or(today);
        Self { start, end: today }
    }
}

/// Ordered observations of one symbol or metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    symbol: String,
    points: Vec<TimePoint>,
}

impl Series {
    /// Build a series, rejecting unsorted or duplicated timestamps.
    pub fn new(symbol: impl Into<String>, points: Vec<TimePoint>) -> Result<Self, EngineError> {
        for pair in points.windows(2) {
            let (previous, next) = (pair[0].timestamp, pair[1].timestamp);
            if next == previous {
                return Err(EngineError::DuplicateTimestamp(next));
            }
            if next < previous {
                return Err(EngineError::UnsortedSeries { previous, next });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    /// Build a series from provider output in any order. Later duplicates win.
    pub fn from_unsorted(symbol: impl Into<String>, mut points: Vec<TimePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let mut deduped: Vec<TimePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The two most recent non-null values, oldest first.
    pub fn last_two_values(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().rev().filter_map(|p| p.value);
        let latest = values.next()?;
        let previous = values.next()?;
        Some((previous, latest))
    }
}

/// A series rescaled so the reference period reads 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSeries {
    pub symbol: String,
    pub reference: PeriodKey,
    /// `true` when the reference value was missing or zero and every point is 100.
    pub degenerate: bool,
    pub points: Vec<TimePoint>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
