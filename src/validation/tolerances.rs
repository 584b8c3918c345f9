use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// Allowed deviation per check category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tolerances {
    pub trade_count: f64,
    pub performance: f64,
    pub risk: f64,
    pub allocation: f64,
    pub unit_consistency: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            trade_count: 0.05,      // 5% signal/trade count drift
            performance: 0.10,      // 10% on ratios and win rate
            risk: 0.15,             // 15% on drawdown
            allocation: 0.001,      // weights must sum to 1.0
            unit_consistency: 0.0,  // bounds are exact
        }
    }
}

impl Tolerances {
    /// Defaults with caller-supplied values replacing individual keys
    pub fn with_overrides(overrides: &ToleranceOverrides) -> Result<Self> {
        let defaults = Self::default();
        let tolerances = Self {
            trade_count: overrides.trade_count.unwrap_or(defaults.trade_count),
            performance: overrides.performance.unwrap_or(defaults.performance),
            risk: overrides.risk.unwrap_or(defaults.risk),
            allocation: overrides.allocation.unwrap_or(defaults.allocation),
            unit_consistency: overrides
                .unit_consistency
                .unwrap_or(defaults.unit_consistency),
        };
        tolerances.validate()?;
        Ok(tolerances)
    }

    fn validate(&self) -> Result<()> {
        let entries = [
            ("trade_count", self.trade_count),
            ("performance", self.performance),
            ("risk", self.risk),
            ("allocation", self.allocation),
            ("unit_consistency", self.unit_consistency),
        ];
        for (key, value) in entries {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidTolerance { key, value });
            }
        }
        Ok(())
    }
}

/// Optional per-key tolerance overrides, as read from settings or flags
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToleranceOverrides {
    pub trade_count: Option<f64>,
    pub performance: Option<f64>,
    pub risk: Option<f64>,
    pub allocation: Option<f64>,
    pub unit_consistency: Option<f64>,
}

impl ToleranceOverrides {
    /// Layer `other` on top of `self`; keys set in `other` win
    pub fn merge(self, other: ToleranceOverrides) -> Self {
        Self {
            trade_count: other.trade_count.or(self.trade_count),
            performance: other.performance.or(self.performance),
            risk: other.risk.or(self.risk),
            allocation: other.allocation.or(self.allocation),
            unit_consistency: other.unit_consistency.or(self.unit_consistency),
        }
    }
}
