use crate::error::CheckError;
use crate::nested::{EntityMetric, MetricPath, NestedMetrics};
use crate::tabular::{Column, TabularSource};
use crate::validation::portfolio::{count_ratio, SIGNAL_INFLATION_RATIO};

/// Nested expectancy above this multiple of the tabular median is inflated
pub const EXPECTANCY_MAGNITUDE_MULTIPLIER: f64 = 100.0;
/// Tabular Sharpe above this counts as meaningfully positive
pub const SIGN_FLIP_POSITIVE: f64 = 0.1;
/// Nested Sharpe below this counts as meaningfully negative
pub const SIGN_FLIP_NEGATIVE: f64 = -0.01;
/// Nested drawdown below this fraction of tabular drawdown is understated
pub const RISK_UNDERSTATEMENT_RATIO: f64 = 0.7;

type Detection<T> = std::result::Result<T, CheckError>;

/// Portfolio-level anomalies found in one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnomalyFindings {
    pub signal_inflation: bool,
    pub expectancy_inflation: bool,
    pub sign_flips: Vec<String>,
    pub risk_understated: Vec<String>,
    /// Human-readable issue lines, including detectors that could not run
    pub issues: Vec<String>,
}

/// Run every detector. A detector that fails adds an issue line instead of
/// aborting the others.
pub fn detect_anomalies(rows: &TabularSource, nested: &NestedMetrics) -> AnomalyFindings {
    let mut findings = AnomalyFindings::default();

    match detect_signal_inflation(rows, nested) {
        Ok(Some(issue)) => {
            findings.signal_inflation = true;
            findings.issues.push(issue);
        }
        Ok(None) => {}
        Err(e) => findings.issues.push(detector_failed("Signal inflation", &e)),
    }

    match detect_expectancy_inflation(rows, nested) {
        Ok(Some(issue)) => {
            findings.expectancy_inflation = true;
            findings.issues.push(issue);
        }
        Ok(None) => {}
        Err(e) => findings.issues.push(detector_failed("Expectancy magnitude", &e)),
    }

    match detect_sign_flips(rows, nested) {
        Ok(entities) if !entities.is_empty() => {
            findings.issues.push(format!(
                "Sign flips: {} entities have positive tabular Sharpe but negative nested Sharpe ({})",
                entities.len(),
                entities.join(", ")
            ));
            findings.sign_flips = entities;
        }
        Ok(_) => {}
        Err(e) => findings.issues.push(detector_failed("Sign flip", &e)),
    }

    match detect_risk_understatement(rows, nested) {
        Ok(entities) if !entities.is_empty() => {
            findings.issues.push(format!(
                "Risk understatement: nested max drawdown below {:.0}% of tabular for {} entities ({})",
                RISK_UNDERSTATEMENT_RATIO * 100.0,
                entities.len(),
                entities.join(", ")
            ));
            findings.risk_understated = entities;
        }
        Ok(_) => {}
        Err(e) => findings.issues.push(detector_failed("Risk understatement", &e)),
    }

    findings
}

fn detector_failed(name: &str, error: &CheckError) -> String {
    tracing::warn!("{} detection failed: {}", name, error);
    format!("{} detection failed: {}", name, error)
}

fn detect_signal_inflation(
    rows: &TabularSource,
    nested: &NestedMetrics,
) -> Detection<Option<String>> {
    let tabular_trades = rows.sum(Column::TotalTrades)?;
    let total_signals = nested.require(&MetricPath::TotalSignals)?;
    let ratio = count_ratio(total_signals, tabular_trades);

    if ratio > SIGNAL_INFLATION_RATIO {
        return Ok(Some(format!(
            "Signal inflation: nested reports {} signals vs {} tabular trades ({:.1}x)",
            total_signals, tabular_trades, ratio
        )));
    }
    Ok(None)
}

fn detect_expectancy_inflation(
    rows: &TabularSource,
    nested: &NestedMetrics,
) -> Detection<Option<String>> {
    let median = rows.median(Column::ExpectancyPerTrade)?;
    let expectancy = nested.require(&MetricPath::Expectancy)?;
    let limit = EXPECTANCY_MAGNITUDE_MULTIPLIER * median.abs();

    if expectancy.abs() > limit {
        return Ok(Some(format!(
            "Expectancy magnitude: nested expectancy {:.4} exceeds {}x tabular median {:.4}",
            expectancy, EXPECTANCY_MAGNITUDE_MULTIPLIER, median
        )));
    }
    Ok(None)
}

fn detect_sign_flips(rows: &TabularSource, nested: &NestedMetrics) -> Detection<Vec<String>> {
    rows.column_values(Column::SharpeRatio)?;

    Ok(rows
        .entities()
        .into_iter()
        .filter(|entity| {
            match (
                rows.entity_mean(entity, Column::SharpeRatio),
                nested.entity_metric(entity, EntityMetric::SharpeRatio),
            ) {
                (Some(tabular), Some(target)) => {
                    tabular > SIGN_FLIP_POSITIVE && target < SIGN_FLIP_NEGATIVE
                }
                _ => false,
            }
        })
        .map(str::to_string)
        .collect())
}

fn detect_risk_understatement(
    rows: &TabularSource,
    nested: &NestedMetrics,
) -> Detection<Vec<String>> {
    rows.column_values(Column::MaxDrawdownPct)?;

    Ok(rows
        .entities()
        .into_iter()
        .filter(|entity| {
            match (
                rows.entity_max_abs(entity, Column::MaxDrawdownPct),
                nested.entity_metric(entity, EntityMetric::MaxDrawdown),
            ) {
                (Some(tabular_pct), Some(target)) => {
                    let tabular = tabular_pct * Column::MaxDrawdownPct.unit_factor();
                    target.abs() < RISK_UNDERSTATEMENT_RATIO * tabular
                }
                _ => false,
            }
        })
        .map(str::to_string)
        .collect())
}
