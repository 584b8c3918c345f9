use crate::engine::{CrossValidationReport, EntityComparison};

const PASS_GLYPH: &str = "✅";
const FAIL_GLYPH: &str = "❌";

/// Human-readable report. Reads only what the report already holds.
pub fn render_markdown(report: &CrossValidationReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    let summary = &report.validation_summary;

    lines.push("# Cross-Validation Report".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- **Generated:** {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(format!("- **Source:** `{}`", report.source));
    lines.push(format!(
        "- **Data quality score:** {:.2} / 1.00",
        report.data_quality_score
    ));
    lines.push(String::new());

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push("| Total | Passed | Failed | Critical | Warnings | Success rate |".to_string());
    lines.push("|---:|---:|---:|---:|---:|---:|".to_string());
    lines.push(format!(
        "| {} | {} | {} | {} | {} | {:.1}% |",
        summary.total,
        summary.passed,
        summary.failed,
        summary.critical,
        summary.warning,
        summary.success_rate * 100.0
    ));
    lines.push(String::new());

    lines.push("## Failed Checks".to_string());
    lines.push(String::new());
    if summary.failed == 0 {
        lines.push("_No failed checks._".to_string());
    } else {
        lines.push("| Check | Severity | Expected | Actual | Tolerance | Message |".to_string());
        lines.push("|---|---|---:|---:|---:|---|".to_string());
        for outcome in summary.failures() {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                escape(&outcome.name),
                outcome.severity,
                escape(&outcome.expected.to_string()),
                escape(&outcome.actual.to_string()),
                outcome.tolerance,
                escape(&outcome.message)
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Entity Comparisons".to_string());
    lines.push(String::new());
    if report.entity_comparisons.is_empty() {
        lines.push("_No entities present in both sources._".to_string());
        lines.push(String::new());
    }
    for entity in &report.entity_comparisons {
        push_entity_table(&mut lines, entity);
    }

    lines.push("## Portfolio Issues".to_string());
    lines.push(String::new());
    if report.portfolio_issues.is_empty() {
        lines.push("_No portfolio-level issues detected._".to_string());
    }
    for issue in &report.portfolio_issues {
        lines.push(format!("- {}", issue));
    }
    lines.push(String::new());

    lines.push("## Recommendations".to_string());
    lines.push(String::new());
    if report.recommendations.is_empty() {
        lines.push("_No action required._".to_string());
    }
    for (i, recommendation) in report.recommendations.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, recommendation));
    }
    lines.push(String::new());

    lines.join("\n")
}

fn push_entity_table(lines: &mut Vec<String>, entity: &EntityComparison) {
    lines.push(format!(
        "### {} (score {:.1}%)",
        escape(&entity.entity),
        entity.overall_score * 100.0
    ));
    lines.push(String::new());
    lines.push("| Metric | Tabular | Nested | Abs diff | Rel diff | Status |".to_string());
    lines.push("|---|---:|---:|---:|---:|:---:|".to_string());
    for c in &entity.comparisons {
        let glyph = if c.within_tolerance { PASS_GLYPH } else { FAIL_GLYPH };
        lines.push(format!(
            "| {} | {:.4} | {:.4} | {:.4} | {} | {} |",
            c.metric,
            c.source_value,
            c.target_value,
            c.absolute_difference,
            percent(c.relative_difference),
            glyph
        ));
    }
    lines.push(String::new());
}

fn percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        "inf".to_string()
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}
