use serde::{Deserialize, Serialize};
use std::fmt;

/// Criticality tier attached to a check outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected/actual value recorded on a check outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CheckValue {
    Number(f64),
    Text(String),
}

impl CheckValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CheckValue::Number(v) => Some(*v),
            CheckValue::Text(_) => None,
        }
    }
}

impl From<f64> for CheckValue {
    fn from(value: f64) -> Self {
        CheckValue::Number(value)
    }
}

impl From<&str> for CheckValue {
    fn from(value: &str) -> Self {
        CheckValue::Text(value.to_string())
    }
}

impl From<String> for CheckValue {
    fn from(value: String) -> Self {
        CheckValue::Text(value)
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::Number(v) if v.is_finite() => write!(f, "{:.4}", v),
            CheckValue::Number(v) => write!(f, "{}", v),
            CheckValue::Text(s) => f.write_str(s),
        }
    }
}

/// The fixed battery of reconciliation checks, in execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    TradeCount,
    SignConsistency,
    RiskBound,
    Allocation,
    UnitConsistency,
    WinRate,
    ExpectancyRange,
}

impl CheckCategory {
    pub const ALL: [CheckCategory; 7] = [
        CheckCategory::TradeCount,
        CheckCategory::SignConsistency,
        CheckCategory::RiskBound,
        CheckCategory::Allocation,
        CheckCategory::UnitConsistency,
        CheckCategory::WinRate,
        CheckCategory::ExpectancyRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCategory::TradeCount => "trade_count",
            CheckCategory::SignConsistency => "sign_consistency",
            CheckCategory::RiskBound => "risk_bound",
            CheckCategory::Allocation => "allocation",
            CheckCategory::UnitConsistency => "unit_consistency",
            CheckCategory::WinRate => "win_rate",
            CheckCategory::ExpectancyRange => "expectancy_range",
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
