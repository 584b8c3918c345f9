use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::error::Error;
use crate::report::{render, ReportFormat};
use crate::validation::ValidationSummary;
use crate::Result;

use super::comparison::EntityComparison;

/// Full outcome of one cross-validation run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CrossValidationReport {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub validation_summary: ValidationSummary,
    pub entity_comparisons: Vec<EntityComparison>,
    pub portfolio_issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub data_quality_score: f64,
}

impl CrossValidationReport {
    /// Entities with at least one metric outside tolerance
    pub fn failed_entities(&self) -> impl Iterator<Item = &EntityComparison> {
        self.entity_comparisons
            .iter()
            .filter(|e| e.overall_score < 1.0)
    }

    /// Render and write the report in a single write
    pub fn write_to(&self, path: impl AsRef<Path>, format: ReportFormat) -> Result<()> {
        let path = path.as_ref();
        let content = render(self, format)?;
        std::fs::write(path, content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Wrote {} report to {}", format, path.display());
        Ok(())
    }
}
