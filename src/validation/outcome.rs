use serde::{Deserialize, Serialize};

use crate::error::CheckError;
use crate::models::{CheckCategory, CheckValue, Severity};

/// Result of one comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub category: CheckCategory,
    pub passed: bool,
    pub expected: CheckValue,
    pub actual: CheckValue,
    pub tolerance: f64,
    pub message: String,
    pub severity: Severity,
}

impl CheckOutcome {
    /// Passing outcome. Passing outcomes are always informational.
    pub fn pass(
        category: CheckCategory,
        name: impl Into<String>,
        expected: impl Into<CheckValue>,
        actual: impl Into<CheckValue>,
        tolerance: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            passed: true,
            expected: expected.into(),
            actual: actual.into(),
            tolerance,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn fail(
        category: CheckCategory,
        name: impl Into<String>,
        expected: impl Into<CheckValue>,
        actual: impl Into<CheckValue>,
        tolerance: f64,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            passed: false,
            expected: expected.into(),
            actual: actual.into(),
            tolerance,
            message: message.into(),
            severity,
        }
    }

    /// Informational note for a check that found nothing to compare
    pub fn note(
        category: CheckCategory,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::pass(category, name, "n/a", "n/a", 0.0, message)
    }

    /// Warning for a check with no data present in both sources. Counts as a
    /// failure so that missing data never reads as agreement.
    pub fn no_data(
        category: CheckCategory,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::fail(
            category,
            name,
            "data in both sources",
            "n/a",
            0.0,
            message,
            Severity::Warning,
        )
    }

    /// The single critical outcome standing in for a check that could not run
    pub fn check_failure(category: CheckCategory, error: &CheckError) -> Self {
        Self::fail(
            category,
            category.as_str(),
            "check completes",
            "check error",
            0.0,
            format!("{} check failed: {}", category, error),
            Severity::Critical,
        )
    }

    pub fn is_critical(&self) -> bool {
        !self.passed && self.severity == Severity::Critical
    }

    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }
}

/// Aggregate over one validation run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub critical: usize,
    pub warning: usize,
    pub success_rate: f64,
    pub outcomes: Vec<CheckOutcome>,
}

impl ValidationSummary {
    pub fn from_outcomes(outcomes: Vec<CheckOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let critical = outcomes.iter().filter(|o| o.is_critical()).count();
        let warning = outcomes.iter().filter(|o| o.is_warning()).count();
        let success_rate = if total > 0 {
            passed as f64 / total as f64
        } else {
            0.0
        };

        Self {
            total,
            passed,
            failed: total - passed,
            critical,
            warning,
            success_rate,
            outcomes,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn critical_outcomes(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| o.is_critical())
    }

    pub fn has_critical(&self) -> bool {
        self.critical > 0
    }

    /// Whether any critical failure belongs to the given category
    pub fn has_critical_in(&self, category: CheckCategory) -> bool {
        self.critical_outcomes().any(|o| o.category == category)
    }
}
