use std::fmt;

use crate::tabular::Column;

/// Per-entity metrics under `ticker_metrics.<entity>.signal_quality_metrics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityMetric {
    WinRate,
    SharpeRatio,
    MaxDrawdown,
    ProfitFactor,
    SortinoRatio,
    CalmarRatio,
}

impl EntityMetric {
    /// The six metrics compared per entity, in report order
    pub const COMPARED: [EntityMetric; 6] = [
        EntityMetric::WinRate,
        EntityMetric::SharpeRatio,
        EntityMetric::MaxDrawdown,
        EntityMetric::ProfitFactor,
        EntityMetric::SortinoRatio,
        EntityMetric::CalmarRatio,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EntityMetric::WinRate => "win_rate",
            EntityMetric::SharpeRatio => "sharpe_ratio",
            EntityMetric::MaxDrawdown => "max_drawdown",
            EntityMetric::ProfitFactor => "profit_factor",
            EntityMetric::SortinoRatio => "sortino_ratio",
            EntityMetric::CalmarRatio => "calmar_ratio",
        }
    }

    /// Tabular column holding the same quantity
    pub fn column(&self) -> Column {
        match self {
            EntityMetric::WinRate => Column::WinRatePct,
            EntityMetric::SharpeRatio => Column::SharpeRatio,
            EntityMetric::MaxDrawdown => Column::MaxDrawdownPct,
            EntityMetric::ProfitFactor => Column::ProfitFactor,
            EntityMetric::SortinoRatio => Column::SortinoRatio,
            EntityMetric::CalmarRatio => Column::CalmarRatio,
        }
    }
}

/// Known locations in the nested metrics document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricPath {
    /// `portfolio_metrics.signals.summary.total.value`
    TotalSignals,
    /// `portfolio_metrics.signal_quality.signal_count.value`
    SignalQualityCount,
    /// `portfolio_metrics.efficiency.expectancy.value`
    Expectancy,
    /// `portfolio_metrics.concurrency.<field>.value`
    Concurrency(String),
    /// `ticker_metrics.<entity>.signal_quality_metrics.<metric>`
    Entity(String, EntityMetric),
    /// `ticker_metrics.<entity>.allocation`
    Allocation(String),
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricPath::TotalSignals => {
                f.write_str("portfolio_metrics.signals.summary.total.value")
            }
            MetricPath::SignalQualityCount => {
                f.write_str("portfolio_metrics.signal_quality.signal_count.value")
            }
            MetricPath::Expectancy => f.write_str("portfolio_metrics.efficiency.expectancy.value"),
            MetricPath::Concurrency(field) => {
                write!(f, "portfolio_metrics.concurrency.{}.value", field)
            }
            MetricPath::Entity(entity, metric) => write!(
                f,
                "ticker_metrics.{}.signal_quality_metrics.{}",
                entity,
                metric.key()
            ),
            MetricPath::Allocation(entity) => write!(f, "ticker_metrics.{}.allocation", entity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_paths() {
        assert_eq!(
            MetricPath::Entity("AAPL".into(), EntityMetric::SharpeRatio).to_string(),
            "ticker_metrics.AAPL.signal_quality_metrics.sharpe_ratio"
        );
        assert_eq!(
            MetricPath::Concurrency("utilization_ratio".into()).to_string(),
            "portfolio_metrics.concurrency.utilization_ratio.value"
        );
    }

    #[test]
    fn test_metric_to_column_mapping() {
        assert_eq!(EntityMetric::WinRate.column(), Column::WinRatePct);
        assert_eq!(EntityMetric::MaxDrawdown.column(), Column::MaxDrawdownPct);
    }
}
