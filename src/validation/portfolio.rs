use crate::error::CheckError;
use crate::models::{CheckCategory, Severity};
use crate::nested::{EntityMetric, MetricPath, NestedMetrics};
use crate::tabular::{Column, TabularSource};

use super::outcome::{CheckOutcome, ValidationSummary};
use super::tolerances::Tolerances;

/// Nested signals above this multiple of tabular trades are inflated
pub const SIGNAL_INFLATION_RATIO: f64 = 10.0;
/// Secondary signal counter deviation (from 1.0) that escalates to critical
pub const SECONDARY_COUNT_CRITICAL_DEVIATION: f64 = 0.5;
/// Sharpe values within ±this are treated as neutral
pub const SIGN_NEUTRAL_BAND: f64 = 0.01;
/// Tabular Sharpe magnitude above which a sign mismatch is critical
pub const SIGN_MATERIAL_MAGNITUDE: f64 = 0.1;
/// Drawdown overshoot (relative) up to which a breach is only a warning
pub const RISK_WARNING_OVERSHOOT: f64 = 0.5;
/// Plausible bound for the nested expectancy scalar
pub const EXPECTANCY_MAX_ABS: f64 = 1_000.0;
/// Expectancy magnitude beyond which a unit error is certain
pub const EXPECTANCY_CRITICAL_ABS: f64 = 10_000.0;
/// Ratios that land in [0, this] instead of [0, 1] are likely percentages
pub const PERCENT_SCALE_MAX: f64 = 100.0;
/// Win-rate differences up to this many tolerances are warnings
pub const WIN_RATE_WARNING_MULTIPLIER: f64 = 2.0;
/// Expectancy range band: `[tabular_min * LOWER, tabular_max * UPPER]`
pub const EXPECTANCY_RANGE_LOWER: f64 = 0.1;
pub const EXPECTANCY_RANGE_UPPER: f64 = 50.0;

type CheckResult = std::result::Result<Vec<CheckOutcome>, CheckError>;

/// Sign bucket for Sharpe comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignBucket {
    Positive,
    Negative,
    Neutral,
}

impl SignBucket {
    fn of(value: f64) -> Self {
        if value > SIGN_NEUTRAL_BAND {
            SignBucket::Positive
        } else if value < -SIGN_NEUTRAL_BAND {
            SignBucket::Negative
        } else {
            SignBucket::Neutral
        }
    }
}

/// `numerator / denominator`, with a zero denominator giving `+inf`
/// (or 1.0 when both sides are zero)
pub fn count_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        if numerator == 0.0 {
            1.0
        } else {
            f64::INFINITY
        }
    } else {
        numerator / denominator
    }
}

/// Runs the fixed battery of reconciliation checks over a tabular source
/// and a nested metrics document.
///
/// Every call builds its own outcome list; the validator holds only its
/// tolerances and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct PortfolioMetricsValidator {
    tolerances: Tolerances,
}

impl PortfolioMetricsValidator {
    pub fn new(tolerances: Tolerances) -> Self {
        Self { tolerances }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Run all checks in order. A failing check becomes one critical outcome
    /// named for its category and the remaining checks still run.
    pub fn validate_all(&self, rows: &TabularSource, nested: &NestedMetrics) -> ValidationSummary {
        tracing::info!(
            "Validating {} tabular rows against nested metrics ({} entities)",
            rows.len(),
            nested.entities().len()
        );

        let mut outcomes = Vec::new();
        for category in CheckCategory::ALL {
            match self.run_check(category, rows, nested) {
                Ok(found) => outcomes.extend(found),
                Err(e) => {
                    tracing::warn!("{} check failed: {}", category, e);
                    outcomes.push(CheckOutcome::check_failure(category, &e));
                }
            }
        }

        for outcome in &outcomes {
            tracing::debug!(
                "{} [{}] passed={} expected={} actual={}",
                outcome.name,
                outcome.severity,
                outcome.passed,
                outcome.expected,
                outcome.actual
            );
        }

        let summary = ValidationSummary::from_outcomes(outcomes);
        tracing::info!(
            "Validation complete: {}/{} passed ({} critical, {} warnings)",
            summary.passed,
            summary.total,
            summary.critical,
            summary.warning
        );
        summary
    }

    fn run_check(
        &self,
        category: CheckCategory,
        rows: &TabularSource,
        nested: &NestedMetrics,
    ) -> CheckResult {
        match category {
            CheckCategory::TradeCount => self.check_trade_count(rows, nested),
            CheckCategory::SignConsistency => self.check_sign_consistency(rows, nested),
            CheckCategory::RiskBound => self.check_risk_bound(rows, nested),
            CheckCategory::Allocation => self.check_allocation(nested),
            CheckCategory::UnitConsistency => self.check_unit_consistency(nested),
            CheckCategory::WinRate => self.check_win_rate(rows, nested),
            CheckCategory::ExpectancyRange => self.check_expectancy_range(rows, nested),
        }
    }

    /// Nested signal counts against summed tabular trades
    fn check_trade_count(&self, rows: &TabularSource, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::TradeCount;
        let tolerance = self.tolerances.trade_count;
        let tabular_trades = rows.sum(Column::TotalTrades)?;
        let total_signals = nested.require(&MetricPath::TotalSignals)?;

        let mut outcomes = Vec::with_capacity(2);

        let ratio = count_ratio(total_signals, tabular_trades);
        let message = format!(
            "Nested total signals {} vs tabular total trades {} (ratio {:.2}x)",
            total_signals, tabular_trades, ratio
        );
        if (ratio - 1.0).abs() <= tolerance {
            outcomes.push(CheckOutcome::pass(
                category,
                "trade_count_total_signals",
                1.0,
                ratio,
                tolerance,
                message,
            ));
        } else {
            let severity = if ratio > SIGNAL_INFLATION_RATIO {
                Severity::Critical
            } else {
                Severity::Warning
            };
            outcomes.push(CheckOutcome::fail(
                category,
                "trade_count_total_signals",
                1.0,
                ratio,
                tolerance,
                message,
                severity,
            ));
        }

        if let Some(signal_count) = nested.get(&MetricPath::SignalQualityCount) {
            let ratio = count_ratio(signal_count, tabular_trades);
            let deviation = (ratio - 1.0).abs();
            let message = format!(
                "Signal quality count {} vs tabular total trades {} (ratio {:.2}x)",
                signal_count, tabular_trades, ratio
            );
            if deviation <= tolerance {
                outcomes.push(CheckOutcome::pass(
                    category,
                    "trade_count_signal_quality",
                    1.0,
                    ratio,
                    tolerance,
                    message,
                ));
            } else {
                let severity = if deviation > SECONDARY_COUNT_CRITICAL_DEVIATION {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                outcomes.push(CheckOutcome::fail(
                    category,
                    "trade_count_signal_quality",
                    1.0,
                    ratio,
                    tolerance,
                    message,
                    severity,
                ));
            }
        }

        Ok(outcomes)
    }

    /// Sharpe sign agreement per entity
    fn check_sign_consistency(&self, rows: &TabularSource, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::SignConsistency;
        rows.column_values(Column::SharpeRatio)?;

        let mut outcomes = Vec::new();
        for entity in rows.entities() {
            let (Some(tabular), Some(nested_value)) = (
                rows.entity_mean(entity, Column::SharpeRatio),
                nested.entity_metric(entity, EntityMetric::SharpeRatio),
            ) else {
                continue;
            };

            let name = format!("sign_consistency_{}", entity);
            let tabular_sign = SignBucket::of(tabular);
            let nested_sign = SignBucket::of(nested_value);

            if tabular_sign == nested_sign {
                outcomes.push(CheckOutcome::pass(
                    category,
                    name,
                    tabular,
                    nested_value,
                    SIGN_NEUTRAL_BAND,
                    format!("{} Sharpe signs agree ({:?})", entity, tabular_sign),
                ));
            } else {
                let severity = if tabular.abs() > SIGN_MATERIAL_MAGNITUDE {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                outcomes.push(CheckOutcome::fail(
                    category,
                    name,
                    tabular,
                    nested_value,
                    SIGN_NEUTRAL_BAND,
                    format!(
                        "{} Sharpe sign mismatch: tabular {:.4} ({:?}) vs nested {:.4} ({:?})",
                        entity, tabular, tabular_sign, nested_value, nested_sign
                    ),
                    severity,
                ));
            }
        }

        if outcomes.is_empty() {
            outcomes.push(CheckOutcome::no_data(
                category,
                "sign_consistency",
                "No entity has a Sharpe ratio in both sources",
            ));
        }
        Ok(outcomes)
    }

    /// Nested drawdown must not exceed tabular drawdown beyond tolerance
    fn check_risk_bound(&self, rows: &TabularSource, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::RiskBound;
        let tolerance = self.tolerances.risk;
        let limit = tolerance * (1.0 + tolerance);
        rows.column_values(Column::MaxDrawdownPct)?;

        let mut outcomes = Vec::new();
        for entity in rows.entities() {
            let (Some(tabular_pct), Some(nested_value)) = (
                rows.entity_max_abs(entity, Column::MaxDrawdownPct),
                nested.entity_metric(entity, EntityMetric::MaxDrawdown),
            ) else {
                continue;
            };

            let tabular = tabular_pct * Column::MaxDrawdownPct.unit_factor();
            let nested_dd = nested_value.abs();
            let overshoot = if nested_dd <= tabular {
                0.0
            } else if tabular == 0.0 {
                f64::INFINITY
            } else {
                (nested_dd - tabular) / tabular
            };

            let name = format!("risk_bound_{}", entity);
            if overshoot <= limit {
                outcomes.push(CheckOutcome::pass(
                    category,
                    name,
                    tabular,
                    nested_dd,
                    limit,
                    format!("{} nested drawdown within bound", entity),
                ));
            } else {
                let severity = if overshoot <= RISK_WARNING_OVERSHOOT {
                    Severity::Warning
                } else {
                    Severity::Critical
                };
                outcomes.push(CheckOutcome::fail(
                    category,
                    name,
                    tabular,
                    nested_dd,
                    limit,
                    format!(
                        "{} nested drawdown {:.4} exceeds tabular {:.4} by {:.1}%",
                        entity,
                        nested_dd,
                        tabular,
                        overshoot * 100.0
                    ),
                    severity,
                ));
            }
        }

        if outcomes.is_empty() {
            outcomes.push(CheckOutcome::no_data(
                category,
                "risk_bound",
                "No entity has a max drawdown in both sources",
            ));
        }
        Ok(outcomes)
    }

    /// Per-entity allocation weights must sum to 1.0
    fn check_allocation(&self, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::Allocation;
        let tolerance = self.tolerances.allocation;

        let weights: Vec<f64> = nested
            .entities()
            .into_iter()
            .filter_map(|e| nested.get(&MetricPath::Allocation(e.to_string())))
            .collect();

        if weights.is_empty() {
            return Ok(vec![CheckOutcome::note(
                category,
                "allocation_weight_sum",
                "No allocation fields present",
            )]);
        }

        let total: f64 = weights.iter().sum();
        let message = format!(
            "{} allocation weights sum to {:.4}",
            weights.len(),
            total
        );
        let outcome = if (total - 1.0).abs() <= tolerance {
            CheckOutcome::pass(category, "allocation_weight_sum", 1.0, total, tolerance, message)
        } else {
            CheckOutcome::fail(
                category,
                "allocation_weight_sum",
                1.0,
                total,
                tolerance,
                message,
                Severity::Critical,
            )
        };
        Ok(vec![outcome])
    }

    /// Scalars must be in their natural units
    fn check_unit_consistency(&self, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::UnitConsistency;
        let slack = self.tolerances.unit_consistency;
        let mut outcomes = Vec::new();

        if let Some(expectancy) = nested.get(&MetricPath::Expectancy) {
            let expected = format!("[-{}, {}]", EXPECTANCY_MAX_ABS, EXPECTANCY_MAX_ABS);
            let magnitude = expectancy.abs();
            if magnitude <= EXPECTANCY_MAX_ABS + slack {
                outcomes.push(CheckOutcome::pass(
                    category,
                    "unit_consistency_expectancy",
                    expected,
                    expectancy,
                    slack,
                    "Expectancy within plausible range",
                ));
            } else {
                let severity = if magnitude > EXPECTANCY_CRITICAL_ABS {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                outcomes.push(CheckOutcome::fail(
                    category,
                    "unit_consistency_expectancy",
                    expected,
                    expectancy,
                    slack,
                    format!("Expectancy {} outside plausible range", expectancy),
                    severity,
                ));
            }
        }

        for field in nested.concurrency_ratio_fields() {
            let path = MetricPath::Concurrency(field.clone());
            let Some(value) = nested.get(&path) else {
                continue;
            };
            let name = format!("unit_consistency_concurrency_{}", field);

            if (-slack..=1.0 + slack).contains(&value) {
                outcomes.push(CheckOutcome::pass(
                    category,
                    name,
                    "[0, 1]",
                    value,
                    slack,
                    format!("{} is a valid ratio", path),
                ));
            } else if (0.0..=PERCENT_SCALE_MAX).contains(&value) {
                outcomes.push(CheckOutcome::fail(
                    category,
                    name,
                    "[0, 1]",
                    value,
                    slack,
                    format!("{} = {} looks like a percentage, expected a ratio", path, value),
                    Severity::Warning,
                ));
            } else {
                outcomes.push(CheckOutcome::fail(
                    category,
                    name,
                    "[0, 1]",
                    value,
                    slack,
                    format!("{} = {} is not a valid ratio", path, value),
                    Severity::Critical,
                ));
            }
        }

        if outcomes.is_empty() {
            outcomes.push(CheckOutcome::no_data(
                category,
                "unit_consistency",
                "No unit-sensitive fields present",
            ));
        }
        Ok(outcomes)
    }

    /// Tabular win rate [%] against nested decimal win rate
    fn check_win_rate(&self, rows: &TabularSource, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::WinRate;
        let tolerance = self.tolerances.performance;
        rows.column_values(Column::WinRatePct)?;

        let mut outcomes = Vec::new();
        for entity in rows.entities() {
            let (Some(tabular_pct), Some(nested_value)) = (
                rows.entity_mean(entity, Column::WinRatePct),
                nested.entity_metric(entity, EntityMetric::WinRate),
            ) else {
                continue;
            };

            let tabular = tabular_pct * Column::WinRatePct.unit_factor();
            let difference = (tabular - nested_value).abs();
            let name = format!("win_rate_{}", entity);
            let message = format!(
                "{} win rate tabular {:.4} vs nested {:.4} (diff {:.4})",
                entity, tabular, nested_value, difference
            );

            if difference <= tolerance {
                outcomes.push(CheckOutcome::pass(
                    category,
                    name,
                    tabular,
                    nested_value,
                    tolerance,
                    message,
                ));
            } else {
                let severity = if difference <= tolerance * WIN_RATE_WARNING_MULTIPLIER {
                    Severity::Warning
                } else {
                    Severity::Critical
                };
                outcomes.push(CheckOutcome::fail(
                    category,
                    name,
                    tabular,
                    nested_value,
                    tolerance,
                    message,
                    severity,
                ));
            }
        }

        if outcomes.is_empty() {
            outcomes.push(CheckOutcome::no_data(
                category,
                "win_rate",
                "No entity has a win rate in both sources",
            ));
        }
        Ok(outcomes)
    }

    /// Nested expectancy must fall in a wide band around tabular expectancy
    fn check_expectancy_range(&self, rows: &TabularSource, nested: &NestedMetrics) -> CheckResult {
        let category = CheckCategory::ExpectancyRange;
        let tabular_min = rows.min(Column::ExpectancyPerTrade)?;
        let tabular_max = rows.max(Column::ExpectancyPerTrade)?;
        let expectancy = nested.require(&MetricPath::Expectancy)?;

        let lower = tabular_min * EXPECTANCY_RANGE_LOWER;
        let upper = tabular_max * EXPECTANCY_RANGE_UPPER;
        let expected = format!("[{:.4}, {:.4}]", lower, upper);

        let outcome = if (lower..=upper).contains(&expectancy) {
            CheckOutcome::pass(
                category,
                "expectancy_range",
                expected,
                expectancy,
                0.0,
                format!("Nested expectancy {:.4} within tabular band", expectancy),
            )
        } else {
            CheckOutcome::fail(
                category,
                "expectancy_range",
                expected,
                expectancy,
                0.0,
                format!(
                    "Nested expectancy {:.4} outside tabular band [{:.4}, {:.4}]",
                    expectancy, lower, upper
                ),
                Severity::Critical,
            )
        };
        Ok(vec![outcome])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::TabularRow;
    use crate::validation::ToleranceOverrides;
    use serde_json::json;

    fn row(
        ticker: &str,
        trades: f64,
        win_pct: f64,
        sharpe: f64,
        dd_pct: f64,
        exp: f64,
    ) -> TabularRow {
        TabularRow::new(ticker)
            .with(Column::TotalTrades, trades)
            .with(Column::WinRatePct, win_pct)
            .with(Column::SharpeRatio, sharpe)
            .with(Column::MaxDrawdownPct, dd_pct)
            .with(Column::ExpectancyPerTrade, exp)
    }

    fn consistent_nested() -> NestedMetrics {
        NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 100 } } },
                "efficiency": { "expectancy": { "value": 2.0 } }
            },
            "ticker_metrics": {
                "AAPL": {
                    "signal_quality_metrics": {
                        "win_rate": 0.62, "sharpe_ratio": 0.5, "max_drawdown": 0.2
                    }
                }
            }
        }))
    }

    fn consistent_rows() -> TabularSource {
        TabularSource::from_rows(vec![row("AAPL", 100.0, 60.0, 0.5, 20.0, 2.0)])
    }

    fn find<'a>(summary: &'a ValidationSummary, name: &str) -> &'a CheckOutcome {
        summary
            .outcomes
            .iter()
            .find(|o| o.name == name)
            .unwrap_or_else(|| panic!("missing outcome {}", name))
    }

    #[test]
    fn test_consistent_sources_pass() {
        let summary = PortfolioMetricsValidator::default()
            .validate_all(&consistent_rows(), &consistent_nested());

        assert_eq!(summary.failed, 0, "{:#?}", summary.outcomes);
        assert_eq!(summary.success_rate, 1.0);
    }

    #[test]
    fn test_signal_inflation_is_critical() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": { "signals": { "summary": { "total": { "value": 1200 } } } }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        let outcome = find(&summary, "trade_count_total_signals");
        assert!(!outcome.passed);
        assert_eq!(outcome.actual.as_f64(), Some(12.0));
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn test_moderate_count_drift_is_warning() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": { "signals": { "summary": { "total": { "value": 150 } } } }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        assert_eq!(find(&summary, "trade_count_total_signals").severity, Severity::Warning);
    }

    #[test]
    fn test_secondary_counter_escalates() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 100 } } },
                "signal_quality": { "signal_count": { "value": 170 } }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        let outcome = find(&summary, "trade_count_signal_quality");
        assert!(!outcome.passed);
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn test_secondary_counter_warning_tier() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 100 } } },
                "signal_quality": { "signal_count": { "value": 130 } }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        assert!(find(&summary, "trade_count_total_signals").passed);
        let outcome = find(&summary, "trade_count_signal_quality");
        assert!(!outcome.passed);
        assert_eq!(outcome.severity, Severity::Warning);
    }

    #[test]
    fn test_secondary_counter_passes_while_primary_fails() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 150 } } },
                "signal_quality": { "signal_count": { "value": 102 } }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        let primary = find(&summary, "trade_count_total_signals");
        assert!(!primary.passed);
        assert_eq!(primary.severity, Severity::Warning);

        let secondary = find(&summary, "trade_count_signal_quality");
        assert!(secondary.passed);
        assert_eq!(secondary.severity, Severity::Info);
    }

    #[test]
    fn test_zero_tabular_trades_gives_infinite_ratio() {
        let rows = TabularSource::from_rows(vec![row("AAPL", 0.0, 60.0, 0.5, 20.0, 2.0)]);
        let summary =
            PortfolioMetricsValidator::default().validate_all(&rows, &consistent_nested());

        let outcome = find(&summary, "trade_count_total_signals");
        assert_eq!(outcome.actual.as_f64(), Some(f64::INFINITY));
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn test_sign_flip_is_critical() {
        let nested = NestedMetrics::new(json!({
            "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "sharpe_ratio": -0.2 } } }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        let outcome = find(&summary, "sign_consistency_AAPL");
        assert!(!outcome.passed);
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn test_small_sign_flip_is_warning() {
        let rows = TabularSource::from_rows(vec![row("AAPL", 100.0, 60.0, 0.05, 20.0, 2.0)]);
        let nested = NestedMetrics::new(json!({
            "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "sharpe_ratio": -0.05 } } }
        }));
        let summary = PortfolioMetricsValidator::default().validate_all(&rows, &nested);

        assert_eq!(find(&summary, "sign_consistency_AAPL").severity, Severity::Warning);
    }

    #[test]
    fn test_risk_bound_severities() {
        let validator = PortfolioMetricsValidator::default();
        let nested = |dd: f64| {
            NestedMetrics::new(json!({
                "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "max_drawdown": dd } } }
            }))
        };

        // limit is 0.15 * 1.15 = 0.1725
        let within = validator.validate_all(&consistent_rows(), &nested(0.23));
        assert!(find(&within, "risk_bound_AAPL").passed);

        let warning = validator.validate_all(&consistent_rows(), &nested(0.26));
        assert_eq!(find(&warning, "risk_bound_AAPL").severity, Severity::Warning);

        let critical = validator.validate_all(&consistent_rows(), &nested(0.35));
        assert_eq!(find(&critical, "risk_bound_AAPL").severity, Severity::Critical);
    }

    #[test]
    fn test_risk_bound_boundaries() {
        // tabular drawdown of 100% keeps the arithmetic exact
        let rows = TabularSource::from_rows(vec![row("AAPL", 100.0, 60.0, 0.5, 100.0, 2.0)]);
        let nested = |dd: f64| {
            NestedMetrics::new(json!({
                "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "max_drawdown": dd } } }
            }))
        };

        // risk 0.25 gives a limit of 0.3125
        let tolerances = Tolerances::with_overrides(&ToleranceOverrides {
            risk: Some(0.25),
            ..Default::default()
        })
        .unwrap();
        let validator = PortfolioMetricsValidator::new(tolerances);

        let at_limit = validator.validate_all(&rows, &nested(1.3125));
        assert!(find(&at_limit, "risk_bound_AAPL").passed);
        let above_limit = validator.validate_all(&rows, &nested(1.3126));
        assert_eq!(find(&above_limit, "risk_bound_AAPL").severity, Severity::Warning);

        // 1.5x the tabular drawdown is the last warning
        let validator = PortfolioMetricsValidator::default();
        let at_warning_edge = validator.validate_all(&rows, &nested(1.5));
        let outcome = find(&at_warning_edge, "risk_bound_AAPL");
        assert!(!outcome.passed);
        assert_eq!(outcome.severity, Severity::Warning);

        let past_warning_edge = validator.validate_all(&rows, &nested(1.5001));
        assert_eq!(find(&past_warning_edge, "risk_bound_AAPL").severity, Severity::Critical);
    }

    #[test]
    fn test_negative_tabular_drawdown_uses_magnitude() {
        let rows = TabularSource::from_rows(vec![row("AAPL", 100.0, 60.0, 0.5, -20.0, 2.0)]);
        let summary =
            PortfolioMetricsValidator::default().validate_all(&rows, &consistent_nested());

        assert!(find(&summary, "risk_bound_AAPL").passed);
    }

    #[test]
    fn test_missing_entity_data_fails_as_warning() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 100 } } },
                "efficiency": { "expectancy": { "value": 2.0 } }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        for name in ["sign_consistency", "risk_bound", "win_rate"] {
            let outcome = find(&summary, name);
            assert!(!outcome.passed, "{}", name);
            assert_eq!(outcome.severity, Severity::Warning, "{}", name);
        }
        // allocation absence stays informational
        assert!(find(&summary, "allocation_weight_sum").passed);
        assert!(summary.success_rate < 1.0);
    }

    #[test]
    fn test_allocation_sum_mismatch() {
        let nested = NestedMetrics::new(json!({
            "ticker_metrics": {
                "A": { "allocation": 0.3 },
                "B": { "allocation": 0.3 },
                "C": { "allocation": 0.3 }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        let outcome = find(&summary, "allocation_weight_sum");
        assert!(!outcome.passed);
        assert_eq!(outcome.expected.as_f64(), Some(1.0));
        assert!((outcome.actual.as_f64().unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_allocation_is_info() {
        let summary = PortfolioMetricsValidator::default()
            .validate_all(&consistent_rows(), &consistent_nested());

        let outcome = find(&summary, "allocation_weight_sum");
        assert!(outcome.passed);
        assert_eq!(outcome.severity, Severity::Info);
    }

    #[test]
    fn test_unit_consistency_bounds() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": {
                "efficiency": { "expectancy": { "value": 25000.0 } },
                "concurrency": {
                    "utilization_ratio": { "value": 45.0 },
                    "overlap_ratio": { "value": 250.0 },
                    "idle_ratio": { "value": 0.3 }
                }
            }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        assert_eq!(find(&summary, "unit_consistency_expectancy").severity, Severity::Critical);
        assert_eq!(
            find(&summary, "unit_consistency_concurrency_utilization_ratio").severity,
            Severity::Warning
        );
        assert_eq!(
            find(&summary, "unit_consistency_concurrency_overlap_ratio").severity,
            Severity::Critical
        );
        assert!(find(&summary, "unit_consistency_concurrency_idle_ratio").passed);
    }

    #[test]
    fn test_moderate_expectancy_is_warning() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": { "efficiency": { "expectancy": { "value": -5000.0 } } }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        assert_eq!(find(&summary, "unit_consistency_expectancy").severity, Severity::Warning);
    }

    #[test]
    fn test_win_rate_tiers() {
        let validator = PortfolioMetricsValidator::default();
        let nested = |wr: f64| {
            NestedMetrics::new(json!({
                "ticker_metrics": { "AAPL": { "signal_quality_metrics": { "win_rate": wr } } }
            }))
        };

        let outcome = |wr: f64| {
            let summary = validator.validate_all(&consistent_rows(), &nested(wr));
            find(&summary, "win_rate_AAPL").clone()
        };

        assert!(outcome(0.62).passed);
        assert_eq!(outcome(0.75).severity, Severity::Warning);
        assert_eq!(outcome(0.95).severity, Severity::Critical);
    }

    #[test]
    fn test_expectancy_out_of_band_is_critical() {
        let nested = NestedMetrics::new(json!({
            "portfolio_metrics": { "efficiency": { "expectancy": { "value": 500.0 } } }
        }));
        let summary =
            PortfolioMetricsValidator::default().validate_all(&consistent_rows(), &nested);

        // band is [0.2, 100.0]
        let outcome = find(&summary, "expectancy_range");
        assert!(!outcome.passed);
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn test_missing_column_becomes_single_critical_and_run_continues() {
        let rows = TabularSource::from_rows(vec![TabularRow::new("AAPL")
            .with(Column::TotalTrades, 100.0)
            .with(Column::SharpeRatio, 0.5)]);
        let summary =
            PortfolioMetricsValidator::default().validate_all(&rows, &consistent_nested());

        let risk: Vec<&CheckOutcome> = summary
            .outcomes
            .iter()
            .filter(|o| o.category == CheckCategory::RiskBound)
            .collect();
        assert_eq!(risk.len(), 1);
        assert_eq!(risk[0].name, "risk_bound");
        assert!(risk[0].is_critical());

        // later checks still ran
        assert!(summary
            .outcomes
            .iter()
            .any(|o| o.category == CheckCategory::ExpectancyRange));
    }

    #[test]
    fn test_outcomes_follow_check_order() {
        let summary = PortfolioMetricsValidator::default()
            .validate_all(&consistent_rows(), &consistent_nested());

        let positions: Vec<usize> = summary
            .outcomes
            .iter()
            .map(|o| CheckCategory::ALL.iter().position(|c| *c == o.category).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_idempotent() {
        let validator = PortfolioMetricsValidator::default();
        let first = validator.validate_all(&consistent_rows(), &consistent_nested());
        let second = validator.validate_all(&consistent_rows(), &consistent_nested());

        assert_eq!(first, second);
    }

    #[test]
    fn test_count_ratio() {
        assert_eq!(count_ratio(1200.0, 100.0), 12.0);
        assert_eq!(count_ratio(5.0, 0.0), f64::INFINITY);
        assert_eq!(count_ratio(0.0, 0.0), 1.0);
    }
}
