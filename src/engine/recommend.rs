use crate::models::CheckCategory;
use crate::validation::ValidationSummary;

use super::anomaly::AnomalyFindings;
use super::comparison::EntityComparison;

/// Success rate below which a comprehensive review is recommended
pub const REVIEW_SUCCESS_RATE: f64 = 0.7;
/// Success rate below which remaining warnings should be addressed
pub const WARNINGS_SUCCESS_RATE: f64 = 0.9;
/// Score deducted per critical failure
pub const CRITICAL_PENALTY: f64 = 0.1;
/// Score deducted per warning
pub const WARNING_PENALTY: f64 = 0.05;

const FIX_SIGNAL_COUNTING: &str =
    "Fix signal counting logic: nested signal totals must match the number of executed tabular trades";
const FIX_SHARPE_SIGNS: &str =
    "Audit Sharpe ratio aggregation for sign errors between per-entity and portfolio calculations";
const FIX_RISK_AGGREGATION: &str =
    "Use portfolio equity curves for risk aggregation instead of combining per-entity drawdowns";
const FIX_ALLOCATION: &str = "Normalize allocation weights so that they sum to 1.0";
const FIX_UNITS: &str =
    "Standardize units: convert percentages to decimals before aggregating ratio and expectancy fields";
const FIX_WIN_RATE: &str =
    "Reconcile win rate units: tabular values are percentages, nested values must be decimals";
const FIX_EXPECTANCY: &str =
    "Recompute portfolio expectancy from trade-level returns rather than summing per-entity values";
const COMPREHENSIVE_REVIEW: &str =
    "Comprehensive review of the metrics pipeline recommended: fewer than 70% of checks passed";
const ADDRESS_WARNINGS: &str =
    "Address remaining warnings to bring the check success rate above 90%";

/// Deterministic remediation list from critical check categories and anomaly flags
pub fn synthesize(summary: &ValidationSummary, findings: &AnomalyFindings) -> Vec<String> {
    let rules: [(bool, &str); 7] = [
        (
            summary.has_critical_in(CheckCategory::TradeCount) || findings.signal_inflation,
            FIX_SIGNAL_COUNTING,
        ),
        (
            summary.has_critical_in(CheckCategory::SignConsistency)
                || !findings.sign_flips.is_empty(),
            FIX_SHARPE_SIGNS,
        ),
        (
            summary.has_critical_in(CheckCategory::RiskBound)
                || !findings.risk_understated.is_empty(),
            FIX_RISK_AGGREGATION,
        ),
        (summary.has_critical_in(CheckCategory::Allocation), FIX_ALLOCATION),
        (
            summary.has_critical_in(CheckCategory::UnitConsistency)
                || findings.expectancy_inflation,
            FIX_UNITS,
        ),
        (summary.has_critical_in(CheckCategory::WinRate), FIX_WIN_RATE),
        (summary.has_critical_in(CheckCategory::ExpectancyRange), FIX_EXPECTANCY),
    ];

    let mut recommendations: Vec<String> = rules
        .iter()
        .filter(|(triggered, _)| *triggered)
        .map(|(_, text)| text.to_string())
        .collect();

    if summary.success_rate < REVIEW_SUCCESS_RATE {
        recommendations.push(COMPREHENSIVE_REVIEW.to_string());
    } else if summary.success_rate < WARNINGS_SUCCESS_RATE {
        recommendations.push(ADDRESS_WARNINGS.to_string());
    }

    recommendations
}

/// Composite data-quality score in [0, 1]
///
/// `((success_rate + mean entity score) / 2) - 0.1 * critical - 0.05 * warnings`,
/// clamped. With no entity comparisons the entity mean is 0: nothing was
/// shown to agree.
pub fn composite_score(summary: &ValidationSummary, entities: &[EntityComparison]) -> f64 {
    let entity_mean = if entities.is_empty() {
        0.0
    } else {
        entities.iter().map(|e| e.overall_score).sum::<f64>() / entities.len() as f64
    };

    let base = (summary.success_rate + entity_mean) / 2.0;
    let penalty =
        CRITICAL_PENALTY * summary.critical as f64 + WARNING_PENALTY * summary.warning as f64;

    (base - penalty).clamp(0.0, 1.0)
}
