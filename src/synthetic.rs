use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::nested::NestedMetrics;
use crate::tabular::{Column, TabularRow, TabularSource};

/// Discrepancy injected into the nested side of a synthetic artifact pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactScenario {
    /// Both sides agree
    Consistent,
    /// Nested signal totals 12x the tabular trade count
    SignalInflation,
    /// Nested Sharpe ratios negated
    SignFlip,
    /// Nested drawdowns halved
    RiskUnderstatement,
    /// Ratios and win rates left in percent instead of decimal
    PercentScaledRatios,
    /// Allocation weights summing to 0.9
    UnnormalizedAllocation,
}

impl ArtifactScenario {
    pub const ALL: [ArtifactScenario; 6] = [
        ArtifactScenario::Consistent,
        ArtifactScenario::SignalInflation,
        ArtifactScenario::SignFlip,
        ArtifactScenario::RiskUnderstatement,
        ArtifactScenario::PercentScaledRatios,
        ArtifactScenario::UnnormalizedAllocation,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            ArtifactScenario::Consistent => "Consistent sources",
            ArtifactScenario::SignalInflation => "Signal inflation (12x)",
            ArtifactScenario::SignFlip => "Sharpe sign flip",
            ArtifactScenario::RiskUnderstatement => "Drawdown halved",
            ArtifactScenario::PercentScaledRatios => "Percent-scaled ratios",
            ArtifactScenario::UnnormalizedAllocation => "Allocations sum to 0.9",
        }
    }
}

/// Generates matching tabular/nested artifact pairs for exercising the engine
pub struct SyntheticArtifactGenerator {
    rng: StdRng,
}

impl SyntheticArtifactGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a tabular source and the nested document derived from it,
    /// then apply the scenario's discrepancy to the nested side.
    pub fn generate(
        &mut self,
        scenario: ArtifactScenario,
        num_entities: usize,
        rows_per_entity: usize,
    ) -> (TabularSource, NestedMetrics) {
        let rows_per_entity = rows_per_entity.max(1);
        let mut rows = Vec::with_capacity(num_entities * rows_per_entity);

        for i in 0..num_entities {
            let ticker = format!("SYN{:02}", i);
            let win_pct = self.rng.gen_range(40.0..65.0);
            let sharpe = self.rng.gen_range(0.3..1.5);
            let drawdown_pct = self.rng.gen_range(8.0..30.0);
            let profit_factor = self.rng.gen_range(1.1..2.0);
            let calmar = self.rng.gen_range(0.2..1.0);
            let expectancy = self.rng.gen_range(0.5..3.0);

            for _ in 0..rows_per_entity {
                rows.push(
                    TabularRow::new(ticker.clone())
                        .with(Column::TotalTrades, self.rng.gen_range(5..30) as f64)
                        .with(Column::WinRatePct, self.jitter(win_pct))
                        .with(Column::SharpeRatio, self.jitter(sharpe))
                        .with(Column::MaxDrawdownPct, self.jitter(drawdown_pct))
                        .with(Column::ProfitFactor, self.jitter(profit_factor))
                        .with(Column::SortinoRatio, self.jitter(sharpe * 1.4))
                        .with(Column::CalmarRatio, self.jitter(calmar))
                        .with(Column::ExpectancyPerTrade, self.jitter(expectancy)),
                );
            }
        }

        let source = TabularSource::from_rows(rows);
        let utilization = self.rng.gen_range(0.2..0.8);
        let nested = build_nested(&source, scenario, utilization);
        (source, nested)
    }

    /// ±1% noise
    fn jitter(&mut self, value: f64) -> f64 {
        value * (1.0 + self.rng.gen_range(-0.01..0.01))
    }
}

/// Nested document whose per-entity values are the tabular means, with the
/// scenario's distortion applied
fn build_nested(
    source: &TabularSource,
    scenario: ArtifactScenario,
    utilization: f64,
) -> NestedMetrics {
    let entities = source.entities();
    let total_trades: f64 = source.rows().iter().filter_map(|r| r.get(Column::TotalTrades)).sum();
    let expectancies: Vec<f64> = source
        .rows()
        .iter()
        .filter_map(|r| r.get(Column::ExpectancyPerTrade))
        .collect();
    let expectancy = crate::tabular::mean(&expectancies).unwrap_or(0.0);

    let total_signals = match scenario {
        ArtifactScenario::SignalInflation => total_trades * 12.0,
        _ => total_trades,
    };
    let utilization_ratio = match scenario {
        ArtifactScenario::PercentScaledRatios => utilization * 100.0,
        _ => utilization,
    };
    let weight_scale = match scenario {
        ArtifactScenario::UnnormalizedAllocation => 0.9,
        _ => 1.0,
    };
    let weight = if entities.is_empty() {
        0.0
    } else {
        weight_scale / entities.len() as f64
    };

    let mut tickers = Map::new();
    for entity in &entities {
        let mean = |column: Column| source.entity_mean(entity, column).unwrap_or(0.0);

        let win_rate = match scenario {
            ArtifactScenario::PercentScaledRatios => mean(Column::WinRatePct),
            _ => mean(Column::WinRatePct) * Column::WinRatePct.unit_factor(),
        };
        let sharpe = match scenario {
            ArtifactScenario::SignFlip => -mean(Column::SharpeRatio),
            _ => mean(Column::SharpeRatio),
        };
        let drawdown = match scenario {
            ArtifactScenario::RiskUnderstatement => {
                mean(Column::MaxDrawdownPct) * Column::MaxDrawdownPct.unit_factor() * 0.5
            }
            _ => mean(Column::MaxDrawdownPct) * Column::MaxDrawdownPct.unit_factor(),
        };

        tickers.insert(
            entity.to_string(),
            json!({
                "signal_quality_metrics": {
                    "win_rate": win_rate,
                    "sharpe_ratio": sharpe,
                    "max_drawdown": drawdown,
                    "profit_factor": mean(Column::ProfitFactor),
                    "sortino_ratio": mean(Column::SortinoRatio),
                    "calmar_ratio": mean(Column::CalmarRatio),
                },
                "allocation": weight,
            }),
        );
    }

    NestedMetrics::new(json!({
        "portfolio_metrics": {
            "signals": { "summary": { "total": { "value": total_signals } } },
            "signal_quality": { "signal_count": { "value": total_signals } },
            "efficiency": { "expectancy": { "value": expectancy } },
            "concurrency": { "utilization_ratio": { "value": utilization_ratio } },
        },
        "ticker_metrics": Value::Object(tickers),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CsvJsonCrossValidator;
    use crate::models::CheckCategory;
    use crate::validation::Tolerances;

    fn run(scenario: ArtifactScenario) -> crate::engine::CrossValidationReport {
        let mut gen = SyntheticArtifactGenerator::new(42);
        let (rows, nested) = gen.generate(scenario, 5, 4);
        CsvJsonCrossValidator::new().reconcile("synthetic", &rows, &nested, Tolerances::default())
    }

    #[test]
    fn test_generator_is_reproducible() {
        let generate =
            || SyntheticArtifactGenerator::new(7).generate(ArtifactScenario::Consistent, 3, 2);
        let first = generate();
        let second = generate();
        assert_eq!(first, second);
        assert_eq!(first.0.len(), 6);
        assert_eq!(first.1.entities().len(), 3);
    }

    #[test]
    fn test_consistent_scenario_is_clean() {
        let report = run(ArtifactScenario::Consistent);

        let summary = &report.validation_summary;
        assert_eq!(summary.failed, 0, "{:#?}", summary.outcomes);
        assert!(report.portfolio_issues.is_empty(), "{:?}", report.portfolio_issues);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.data_quality_score, 1.0);
    }

    #[test]
    fn test_signal_inflation_scenario() {
        let report = run(ArtifactScenario::SignalInflation);
        assert!(report.validation_summary.has_critical_in(CheckCategory::TradeCount));
    }

    #[test]
    fn test_sign_flip_scenario() {
        let report = run(ArtifactScenario::SignFlip);
        assert!(report.validation_summary.has_critical_in(CheckCategory::SignConsistency));
        assert!(report.portfolio_issues.iter().any(|i| i.starts_with("Sign flips: 5 entities")));
    }

    #[test]
    fn test_risk_understatement_scenario() {
        let report = run(ArtifactScenario::RiskUnderstatement);
        assert!(report.portfolio_issues.iter().any(|i| i.starts_with("Risk understatement")));
    }

    #[test]
    fn test_percent_scaled_scenario() {
        let report = run(ArtifactScenario::PercentScaledRatios);
        let summary = &report.validation_summary;

        assert!(summary
            .failures()
            .any(|o| o.name == "unit_consistency_concurrency_utilization_ratio"));
        assert!(summary.has_critical_in(CheckCategory::WinRate));
    }

    #[test]
    fn test_unnormalized_allocation_scenario() {
        let report = run(ArtifactScenario::UnnormalizedAllocation);
        assert!(report.validation_summary.has_critical_in(CheckCategory::Allocation));
    }
}
