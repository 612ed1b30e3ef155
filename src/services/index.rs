//! Index normalisation and weighted basket composites.
//!
//! Pure functions only. Missing observations are carried as `None` end to end; the only
//! errors are structural (bad weights, bad keys), which are caller bugs.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::{NormalizedSeries, PeriodKey, Series, TimePoint};

/// Value every normalised series reads at its reference period.
pub const INDEX_BASE: f64 = 100.0;

/// Round half up (toward positive infinity) to a whole number.
pub fn round_half_up(value: f64) -> f64 {
    // Exact for every representable half; `value + 0.5` is not.
    if value - value.floor() == 0.5 {
        value.ceil()
    } else {
        value.round()
    }
}

/// Rescale `series` so the first point at or after `reference` reads exactly 100.
///
/// A missing, null or zero reference value yields a flat 100 at every input timestamp.
/// Output values are whole numbers; null inputs stay null.
pub fn normalize(series: &Series, reference: PeriodKey) -> NormalizedSeries {
    let reference_value = series
        .points()
        .iter()
        .find(|p| p.period().is_some_and(|key| key >= reference))
        .and_then(|p| p.value)
        .filter(|v| *v != 0.0 && v.is_finite());

    let (degenerate, points) = match reference_value {
        Some(base) => (
            false,
            series
                .points()
                .iter()
                .map(|p| {
                    TimePoint::new(p.timestamp, p.value.map(|v| round_half_up(v / base * INDEX_BASE)))
                })
                .collect(),
        ),
        None => (
            true,
            series
                .points()
                .iter()
                .map(|p| TimePoint::new(p.timestamp, Some(INDEX_BASE)))
                .collect(),
        ),
    };

    NormalizedSeries {
        symbol: series.symbol().to_string(),
        reference,
        degenerate,
        points,
    }
}

/// Period keys of the base series, in order, one per period.
pub fn build_timeline(base: &[TimePoint]) -> Vec<PeriodKey> {
    let mut timeline: Vec<PeriodKey> = Vec::with_capacity(base.len());
    for key in base.iter().filter_map(TimePoint::period) {
        if timeline.last() != Some(&key) {
            timeline.push(key);
        }
    }
    timeline
}

/// Lookup of a series by period, restricted to a timeline.
///
/// Absent keys map to `None`, as do present-but-null observations. When several points
/// fall in one period the latest wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    values: HashMap<PeriodKey, Option<f64>>,
}

impl AlignedSeries {
    pub fn get(&self, key: &PeriodKey) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    /// Whether the series had a point in this period (even a null one).
    pub fn has_point(&self, key: &PeriodKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn align_series(points: &[TimePoint], timeline: &[PeriodKey]) -> AlignedSeries {
    let mut by_period: HashMap<PeriodKey, Option<f64>> = HashMap::with_capacity(points.len());
    for point in points {
        if let Some(key) = point.period() {
            by_period.insert(key, point.value);
        }
    }

    let values = timeline
        .iter()
        .filter_map(|key| by_period.get(key).map(|value| (*key, *value)))
        .collect();

    AlignedSeries { values }
}

/// Weighted average over the members that have a value at `key`.
///
/// Members without a value are left out of both numerator and denominator. Returns `None`
/// when no weight remains.
pub fn composite_at<'a, I>(key: &PeriodKey, members: I) -> Option<f64>
where
    I: IntoIterator<Item = (&'a AlignedSeries, f64)>,
{
    let (weighted_sum, total_weight) = members
        .into_iter()
        .filter_map(|(series, weight)| series.get(key).map(|value| (value, weight)))
        .fold((0.0, 0.0), |(sum, total), (value, weight)| {
            (sum + value * weight, total + weight)
        });

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
struct BasketMember {
    symbol: String,
    weight: f64,
    series: AlignedSeries,
}

/// A set of weighted normalised series aligned to one timeline.
#[derive(Debug, Clone, Default)]
pub struct WeightedBasket {
    members: Vec<BasketMember>,
}

impl WeightedBasket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Weights need not sum to one but must be non-negative.
    pub fn add(
        &mut self,
        symbol: impl Into<String>,
        weight: f64,
        series: AlignedSeries,
    ) -> Result<(), EngineError> {
        let symbol = symbol.into();
        if !(weight >= 0.0) || !weight.is_finite() {
            return Err(EngineError::NegativeWeight { symbol, weight });
        }
        self.members.push(BasketMember {
            symbol,
            weight,
            series,
        });
        Ok(())
    }

    pub fn composite_at(&self, key: &PeriodKey) -> Option<f64> {
        composite_at(key, self.members.iter().map(|m| (&m.series, m.weight)))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PeriodKey {
        PeriodKey::parse(s).unwrap()
    }

    fn monthly(symbol: &str, values: &[(&str, Option<f64>)]) -> Series {
        Series::new(
            symbol,
            values
                .iter()
                .map(|(month, value)| TimePoint::at(key(month), *value))
                .collect(),
        )
        .unwrap()
    }

    fn values(series: &NormalizedSeries) -> Vec<Option<f64>> {
        series.points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(103.5), 104.0);
        assert_eq!(round_half_up(103.49), 103.0);
        assert_eq!(round_half_up(99.5), 100.0);
        assert_eq!(round_half_up(100.0), 100.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.51), -3.0);
        assert!(round_half_up(f64::NAN).is_nan());
    }

    #[test]
    fn test_normalize_reference_reads_100() {
        let series = monthly(
            "NVDA",
            &[
                ("2023-12", Some(40.0)),
                ("2024-01", Some(50.0)),
                ("2024-02", Some(60.0)),
                ("2024-03", Some(75.0)),
            ],
        );
        let normalized = normalize(&series, key("2024-01"));
        assert!(!normalized.degenerate);
        assert_eq!(
            values(&normalized),
            vec![Some(80.0), Some(100.0), Some(120.0), Some(150.0)]
        );
    }

    #[test]
    fn test_normalize_uses_first_point_on_or_after_reference() {
        // No January point; February becomes the reference.
        let series = monthly("ISRG", &[("2023-11", Some(10.0)), ("2024-02", Some(20.0))]);
        let normalized = normalize(&series, key("2024-01"));
        assert_eq!(values(&normalized), vec![Some(50.0), Some(100.0)]);
    }

    #[test]
    fn test_normalize_rounds_to_whole_numbers() {
        let series = monthly("ROK", &[("2024-01", Some(3.0)), ("2024-02", Some(4.0))]);
        let normalized = normalize(&series, key("2024-01"));
        // 4 / 3 * 100 = 133.33
        assert_eq!(values(&normalized), vec![Some(100.0), Some(133.0)]);
    }

    #[test]
    fn test_normalize_preserves_gaps() {
        let series = monthly(
            "SYM",
            &[("2024-01", Some(10.0)), ("2024-02", None), ("2024-03", Some(15.0))],
        );
        let normalized = normalize(&series, key("2024-01"));
        assert_eq!(values(&normalized), vec![Some(100.0), None, Some(150.0)]);
    }

    #[test]
    fn test_normalize_zero_reference_is_flat() {
        let series = monthly("PATH", &[("2024-01", Some(0.0)), ("2024-02", Some(50.0))]);
        let normalized = normalize(&series, key("2024-01"));
        assert!(normalized.degenerate);
        assert_eq!(normalized.len(), 2);
        assert_eq!(values(&normalized), vec![Some(100.0), Some(100.0)]);
        assert_eq!(normalized.points[0].period(), Some(key("2024-01")));
        assert_eq!(normalized.points[1].period(), Some(key("2024-02")));
    }

    #[test]
    fn test_normalize_null_reference_is_flat() {
        let series = monthly("TSLA", &[("2024-01", None), ("2024-02", Some(5.0)), ("2024-03", None)]);
        let normalized = normalize(&series, key("2024-01"));
        assert!(normalized.degenerate);
        assert_eq!(values(&normalized), vec![Some(100.0); 3]);
    }

    #[test]
    fn test_normalize_reference_after_series_is_flat() {
        let series = monthly("ABB", &[("2023-01", Some(5.0)), ("2023-02", Some(6.0))]);
        let normalized = normalize(&series, key("2024-01"));
        assert!(normalized.degenerate);
        assert_eq!(values(&normalized), vec![Some(100.0), Some(100.0)]);
    }

    #[test]
    fn test_normalize_empty_series() {
        let series = Series::new("EMPTY", vec![]).unwrap();
        let normalized = normalize(&series, key("2024-01"));
        assert!(normalized.is_empty());
    }

    #[test]
    fn test_build_timeline_preserves_order() {
        let base = monthly(
            "NVDA",
            &[("2024-01", Some(1.0)), ("2024-02", None), ("2024-03", Some(3.0))],
        );
        assert_eq!(
            build_timeline(base.points()),
            vec![key("2024-01"), key("2024-02"), key("2024-03")]
        );
    }

    #[test]
    fn test_build_timeline_one_key_per_period() {
        let jan = key("2024-01").start_timestamp();
        let points = vec![
            TimePoint::new(jan, Some(1.0)),
            TimePoint::new(jan + 86_400, Some(2.0)),
            TimePoint::at(key("2024-02"), Some(3.0)),
        ];
        assert_eq!(build_timeline(&points), vec![key("2024-01"), key("2024-02")]);
    }

    #[test]
    fn test_align_series_missing_key_is_none() {
        let base = monthly(
            "BASE",
            &[("2024-01", Some(1.0)), ("2024-02", Some(1.0)), ("2024-03", Some(1.0))],
        );
        let timeline = build_timeline(base.points());
        let secondary = monthly("SPY", &[("2024-01", Some(100.0)), ("2024-03", Some(110.0))]);

        let aligned = align_series(secondary.points(), &timeline);
        assert_eq!(aligned.get(&key("2024-01")), Some(100.0));
        assert_eq!(aligned.get(&key("2024-02")), None);
        assert!(!aligned.has_point(&key("2024-02")));
        assert_eq!(aligned.get(&key("2024-03")), Some(110.0));
    }

    #[test]
    fn test_align_series_never_extends_timeline() {
        let timeline = vec![key("2024-01")];
        let secondary = monthly("QQQ", &[("2024-01", Some(1.0)), ("2024-02", Some(2.0))]);
        let aligned = align_series(secondary.points(), &timeline);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.get(&key("2024-02")), None);
    }

    #[test]
    fn test_align_series_distinguishes_null_from_zero() {
        let timeline = vec![key("2024-01"), key("2024-02")];
        let secondary = monthly("XLI", &[("2024-01", Some(0.0)), ("2024-02", None)]);
        let aligned = align_series(secondary.points(), &timeline);
        assert_eq!(aligned.get(&key("2024-01")), Some(0.0));
        assert_eq!(aligned.get(&key("2024-02")), None);
        assert!(aligned.has_point(&key("2024-02")));
    }

    #[test]
    fn test_align_series_latest_point_in_period_wins() {
        let jan = key("2024-01").start_timestamp();
        let points = vec![
            TimePoint::new(jan, Some(1.0)),
            TimePoint::new(jan + 86_400, Some(2.0)),
        ];
        let aligned = align_series(&points, &[key("2024-01")]);
        assert_eq!(aligned.get(&key("2024-01")), Some(2.0));
    }

    fn aligned(month: &str, value: Option<f64>) -> AlignedSeries {
        align_series(&[TimePoint::at(key(month), value)], &[key(month)])
    }

    #[test]
    fn test_composite_excludes_missing_members() {
        let d = key("2024-03");
        let a = aligned("2024-03", Some(120.0));
        let b = aligned("2024-03", Some(80.0));
        let c = AlignedSeries::default();

        let composite = composite_at(&d, [(&a, 0.6), (&b, 0.4), (&c, 0.2)]).unwrap();
        assert!((composite - 104.0).abs() < 1e-9);
        assert_eq!(round_half_up(composite), 104.0);
    }

    #[test]
    fn test_composite_renormalises_by_present_weight() {
        let d = key("2024-03");
        let a = aligned("2024-03", Some(110.0));
        let b = aligned("2024-03", Some(90.0));
        let c = aligned("2024-03", None);

        // (0.5*110 + 0.3*90) / 0.8 = 102.5, not diluted to 82
        let composite = composite_at(&d, [(&a, 0.5), (&b, 0.3), (&c, 0.2)]).unwrap();
        assert!((composite - 102.5).abs() < 1e-9);
    }

    #[test]
    fn test_composite_exhaustion_is_none() {
        let d = key("2024-03");
        let a = aligned("2024-01", Some(100.0));
        let b = aligned("2024-03", None);
        assert_eq!(composite_at(&d, [(&a, 0.5), (&b, 0.5)]), None);
        assert_eq!(composite_at(&d, std::iter::empty::<(&AlignedSeries, f64)>()), None);
    }

    #[test]
    fn test_composite_zero_weights_is_none() {
        let d = key("2024-03");
        let a = aligned("2024-03", Some(100.0));
        assert_eq!(composite_at(&d, [(&a, 0.0)]), None);
    }

    #[test]
    fn test_basket_rejects_negative_weight() {
        let mut basket = WeightedBasket::new();
        let err = basket
            .add("NVDA", -0.1, AlignedSeries::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::NegativeWeight { .. }));
        assert!(basket.add("NVDA", f64::NAN, AlignedSeries::default()).is_err());
        assert!(basket.is_empty());
    }

    #[test]
    fn test_basket_composite() {
        let mut basket = WeightedBasket::new();
        basket.add("A", 0.6, aligned("2024-03", Some(120.0))).unwrap();
        basket.add("B", 0.4, aligned("2024-03", Some(80.0))).unwrap();
        basket.add("C", 0.2, AlignedSeries::default()).unwrap();

        assert_eq!(basket.len(), 3);
        assert_eq!(basket.symbols().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(basket.composite_at(&key("2024-03")).map(round_half_up), Some(104.0));
        assert_eq!(basket.composite_at(&key("2024-04")), None);
    }
}
