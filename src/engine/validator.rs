use chrono::Utc;
use std::path::PathBuf;

use crate::nested::NestedMetrics;
use crate::report::ReportFormat;
use crate::tabular::TabularSource;
use crate::validation::{PortfolioMetricsValidator, ToleranceOverrides, Tolerances};
use crate::Result;

use super::anomaly::detect_anomalies;
use super::comparison::compare_entities;
use super::recommend::{composite_score, synthesize};
use super::report::CrossValidationReport;

/// Inputs for one cross-validation run
#[derive(Debug, Clone)]
pub struct CrossValidationConfig {
    /// Tabular (CSV) source to load
    pub source_path: PathBuf,
    pub nested_metrics: NestedMetrics,
    pub tolerances: Option<ToleranceOverrides>,
    pub output_path: Option<PathBuf>,
    pub generate_report: bool,
    /// Output format; inferred from `output_path` when unset
    pub format: Option<ReportFormat>,
}

impl CrossValidationConfig {
    pub fn new(source_path: impl Into<PathBuf>, nested_metrics: NestedMetrics) -> Self {
        Self {
            source_path: source_path.into(),
            nested_metrics,
            tolerances: None,
            output_path: None,
            generate_report: false,
            format: None,
        }
    }

    pub fn with_tolerances(mut self, overrides: ToleranceOverrides) -> Self {
        self.tolerances = Some(overrides);
        self
    }

    /// Write the finished report to `path`
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self.generate_report = true;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Reconciles a tabular backtest export with its nested metrics document
pub struct CsvJsonCrossValidator;

impl CsvJsonCrossValidator {
    pub fn new() -> Self {
        Self
    }

    /// Load the tabular source, reconcile it against the nested metrics and
    /// optionally write the report.
    ///
    /// Only a load failure (or an invalid tolerance / failed report write) is
    /// an error; every finding lands in the returned report.
    pub fn cross_validate(&self, config: &CrossValidationConfig) -> Result<CrossValidationReport> {
        let rows = TabularSource::from_path(&config.source_path)?;
        let tolerances =
            Tolerances::with_overrides(&config.tolerances.clone().unwrap_or_default())?;

        let report = self.reconcile(
            &config.source_path.display().to_string(),
            &rows,
            &config.nested_metrics,
            tolerances,
        );

        if config.generate_report {
            match &config.output_path {
                Some(path) => {
                    let format = config.format.unwrap_or_else(|| ReportFormat::from_path(path));
                    report.write_to(path, format)?;
                }
                None => tracing::warn!("Report generation requested without an output path"),
            }
        }

        Ok(report)
    }

    /// Reconcile already-loaded sources. Pure apart from the report timestamp.
    pub fn reconcile(
        &self,
        source: &str,
        rows: &TabularSource,
        nested: &NestedMetrics,
        tolerances: Tolerances,
    ) -> CrossValidationReport {
        tracing::info!("Cross-validating {} ({} rows)", source, rows.len());

        let validation_summary =
            PortfolioMetricsValidator::new(tolerances).validate_all(rows, nested);
        let entity_comparisons = compare_entities(rows, nested, tolerances.performance);
        let findings = detect_anomalies(rows, nested);
        let recommendations = synthesize(&validation_summary, &findings);
        let data_quality_score = composite_score(&validation_summary, &entity_comparisons);

        tracing::info!(
            "Cross-validation of {} complete: score {:.2}, {} critical, {} issues",
            source,
            data_quality_score,
            validation_summary.critical,
            findings.issues.len()
        );

        CrossValidationReport {
            timestamp: Utc::now(),
            source: source.to_string(),
            validation_summary,
            entity_comparisons,
            portfolio_issues: findings.issues,
            recommendations,
            data_quality_score,
        }
    }
}

impl Default for CsvJsonCrossValidator {
    fn default() -> Self {
        Self::new()
    }
}
