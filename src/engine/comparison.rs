use serde::{Deserialize, Serialize};

use crate::nested::{EntityMetric, NestedMetrics};
use crate::tabular::TabularSource;

/// One metric compared between the two sources for one entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricComparison {
    pub metric: String,
    /// Tabular value, converted into the nested document's unit
    pub source_value: f64,
    pub target_value: f64,
    pub absolute_difference: f64,
    pub relative_difference: f64,
    pub within_tolerance: bool,
    pub tolerance: f64,
}

impl MetricComparison {
    pub fn new(metric: &str, source_value: f64, target_value: f64, tolerance: f64) -> Self {
        let absolute_difference = (source_value - target_value).abs();
        let relative_difference = relative_difference(source_value, absolute_difference);
        Self {
            metric: metric.to_string(),
            source_value,
            target_value,
            absolute_difference,
            relative_difference,
            within_tolerance: relative_difference <= tolerance,
            tolerance,
        }
    }
}

/// `difference / |baseline|`; a zero baseline gives `+inf` for any positive
/// difference and 0.0 otherwise
pub fn relative_difference(baseline: f64, absolute_difference: f64) -> f64 {
    if baseline == 0.0 {
        if absolute_difference > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        absolute_difference / baseline.abs()
    }
}

/// All metric comparisons for one entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityComparison {
    pub entity: String,
    pub comparisons: Vec<MetricComparison>,
    /// Fraction of comparisons within tolerance
    pub overall_score: f64,
}

impl EntityComparison {
    pub fn new(entity: impl Into<String>, comparisons: Vec<MetricComparison>) -> Self {
        let overall_score = if comparisons.is_empty() {
            0.0
        } else {
            comparisons.iter().filter(|c| c.within_tolerance).count() as f64
                / comparisons.len() as f64
        };
        Self {
            entity: entity.into(),
            comparisons,
            overall_score,
        }
    }

    pub fn failed_metrics(&self) -> impl Iterator<Item = &MetricComparison> {
        self.comparisons.iter().filter(|c| !c.within_tolerance)
    }
}

/// Compare the six per-entity metrics for every entity present in both sources.
///
/// Entities missing from either side are skipped, as is any metric missing
/// on either side for a given entity. Drawdown is compared by magnitude on
/// both sides, matching the risk-bound check.
pub fn compare_entities(
    rows: &TabularSource,
    nested: &NestedMetrics,
    tolerance: f64,
) -> Vec<EntityComparison> {
    let mut results = Vec::new();

    for entity in rows.entities() {
        if !nested.has_entity(entity) {
            tracing::debug!("Skipping {}: not present in nested metrics", entity);
            continue;
        }

        let comparisons: Vec<MetricComparison> = EntityMetric::COMPARED
            .iter()
            .filter_map(|metric| {
                let column = metric.column();
                let target = nested.entity_metric(entity, *metric)?;
                let (tabular, target) = match metric {
                    EntityMetric::MaxDrawdown => {
                        (rows.entity_mean_abs(entity, column)?, target.abs())
                    }
                    _ => (rows.entity_mean(entity, column)?, target),
                };
                Some(MetricComparison::new(
                    metric.key(),
                    tabular * column.unit_factor(),
                    target,
                    tolerance,
                ))
            })
            .collect();

        if comparisons.is_empty() {
            tracing::debug!("Skipping {}: no metric present in both sources", entity);
            continue;
        }

        let comparison = EntityComparison::new(entity, comparisons);
        tracing::debug!(
            "{}: {}/{} metrics within tolerance",
            comparison.entity,
            comparison.comparisons.len() - comparison.failed_metrics().count(),
            comparison.comparisons.len()
        );
        results.push(comparison);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{Column, TabularRow};
    use serde_json::json;

    #[test]
    fn test_relative_difference_zero_baseline() {
        assert_eq!(relative_difference(0.0, 0.5), f64::INFINITY);
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
        assert_eq!(relative_difference(-2.0, 1.0), 0.5);
    }

    #[test]
    fn test_metric_comparison_within_tolerance() {
        let c = MetricComparison::new("win_rate", 0.60, 0.62, 0.10);
        assert!((c.absolute_difference - 0.02).abs() < 1e-12);
        assert!(c.within_tolerance);

        let zero = MetricComparison::new("sharpe_ratio", 0.0, 0.3, 0.10);
        assert_eq!(zero.relative_difference, f64::INFINITY);
        assert!(!zero.within_tolerance);
    }

    #[test]
    fn test_compare_entities_converts_units_and_skips_missing() {
        let rows = TabularSource::from_rows(vec![
            TabularRow::new("AAPL")
                .with(Column::WinRatePct, 60.0)
                .with(Column::MaxDrawdownPct, 20.0)
                .with(Column::SharpeRatio, 1.0),
            TabularRow::new("AAPL")
                .with(Column::WinRatePct, 50.0)
                .with(Column::MaxDrawdownPct, 30.0)
                .with(Column::SharpeRatio, 2.0),
            TabularRow::new("TSLA").with(Column::WinRatePct, 40.0),
        ]);
        let nested = NestedMetrics::new(json!({
            "ticker_metrics": {
                "AAPL": { "signal_quality_metrics": {
                    "win_rate": 0.55, "max_drawdown": 0.25,
                    "sharpe_ratio": 3.0, "profit_factor": 1.4
                } }
            }
        }));

        let results = compare_entities(&rows, &nested, 0.10);

        assert_eq!(results.len(), 1);
        let aapl = &results[0];
        assert_eq!(aapl.entity, "AAPL");
        // profit factor missing in tabular rows, so three comparisons
        assert_eq!(aapl.comparisons.len(), 3);
        assert_eq!(aapl.comparisons[0].metric, "win_rate");
        assert!((aapl.comparisons[0].source_value - 0.55).abs() < 1e-12);
        assert!(aapl.comparisons[0].within_tolerance);
        // Sharpe 1.5 vs 3.0 is off by 100%
        assert!(!aapl.comparisons[1].within_tolerance);
        assert!((aapl.overall_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_tabular_drawdown_compares_by_magnitude() {
        let rows = TabularSource::from_rows(vec![TabularRow::new("AAPL")
            .with(Column::MaxDrawdownPct, -20.0)]);
        let nested = NestedMetrics::new(json!({
            "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "max_drawdown": 0.2 } } }
        }));

        let results = compare_entities(&rows, &nested, 0.10);
        let drawdown = &results[0].comparisons[0];

        assert_eq!(drawdown.metric, "max_drawdown");
        assert!((drawdown.source_value - 0.2).abs() < 1e-12);
        assert!(drawdown.relative_difference < 1e-12);
        assert!(drawdown.within_tolerance);
        assert_eq!(results[0].overall_score, 1.0);
    }

    #[test]
    fn test_entity_score_empty() {
        assert_eq!(EntityComparison::new("X", vec![]).overall_score, 0.0);
    }
}
