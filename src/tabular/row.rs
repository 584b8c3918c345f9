use serde::{Deserialize, Serialize};

/// Numeric columns of the flat per-entity backtest export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    TotalTrades,
    WinRatePct,
    SharpeRatio,
    MaxDrawdownPct,
    ProfitFactor,
    SortinoRatio,
    CalmarRatio,
    ExpectancyPerTrade,
}

impl Column {
    /// Header text as written by the backtest export
    pub fn header(&self) -> &'static str {
        match self {
            Column::TotalTrades => "Total Trades",
            Column::WinRatePct => "Win Rate [%]",
            Column::SharpeRatio => "Sharpe Ratio",
            Column::MaxDrawdownPct => "Max Drawdown [%]",
            Column::ProfitFactor => "Profit Factor",
            Column::SortinoRatio => "Sortino Ratio",
            Column::CalmarRatio => "Calmar Ratio",
            Column::ExpectancyPerTrade => "Expectancy per Trade",
        }
    }

    /// Factor that converts the tabular unit into the nested document's unit.
    /// Percent columns are stored as decimals in the nested document.
    pub fn unit_factor(&self) -> f64 {
        match self {
            Column::WinRatePct | Column::MaxDrawdownPct => 0.01,
            _ => 1.0,
        }
    }
}

/// One row of the tabular source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabularRow {
    #[serde(rename = "Ticker", alias = "ticker", alias = "Entity")]
    pub ticker: String,
    #[serde(rename = "Total Trades", default)]
    pub total_trades: Option<f64>,
    #[serde(rename = "Win Rate [%]", default)]
    pub win_rate_pct: Option<f64>,
    #[serde(rename = "Sharpe Ratio", default)]
    pub sharpe_ratio: Option<f64>,
    #[serde(rename = "Max Drawdown [%]", default)]
    pub max_drawdown_pct: Option<f64>,
    #[serde(rename = "Profit Factor", default)]
    pub profit_factor: Option<f64>,
    #[serde(rename = "Sortino Ratio", default)]
    pub sortino_ratio: Option<f64>,
    #[serde(rename = "Calmar Ratio", default)]
    pub calmar_ratio: Option<f64>,
    #[serde(rename = "Expectancy per Trade", default)]
    pub expectancy_per_trade: Option<f64>,
}

impl TabularRow {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Value of a column, treating NaN cells as missing
    pub fn get(&self, column: Column) -> Option<f64> {
        let value = match column {
            Column::TotalTrades => self.total_trades,
            Column::WinRatePct => self.win_rate_pct,
            Column::SharpeRatio => self.sharpe_ratio,
            Column::MaxDrawdownPct => self.max_drawdown_pct,
            Column::ProfitFactor => self.profit_factor,
            Column::SortinoRatio => self.sortino_ratio,
            Column::CalmarRatio => self.calmar_ratio,
            Column::ExpectancyPerTrade => self.expectancy_per_trade,
        };
        value.filter(|v| !v.is_nan())
    }

    pub fn set(&mut self, column: Column, value: f64) {
        let slot = match column {
            Column::TotalTrades => &mut self.total_trades,
            Column::WinRatePct => &mut self.win_rate_pct,
            Column::SharpeRatio => &mut self.sharpe_ratio,
            Column::MaxDrawdownPct => &mut self.max_drawdown_pct,
            Column::ProfitFactor => &mut self.profit_factor,
            Column::SortinoRatio => &mut self.sortino_ratio,
            Column::CalmarRatio => &mut self.calmar_ratio,
            Column::ExpectancyPerTrade => &mut self.expectancy_per_trade,
        };
        *slot = Some(value);
    }

    /// Builder-style setter used by fixtures and the synthetic generator
    pub fn with(mut self, column: Column, value: f64) -> Self {
        self.set(column, value);
        self
    }
}
