use anyhow::{Context, Result};
use clap::Parser;
use crossval::report::{render, ReportFormat};
use crossval::settings::Settings;
use crossval::{
    CrossValidationConfig, CrossValidationReport, CsvJsonCrossValidator, NestedMetrics,
    ToleranceOverrides,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit code when --fail-on-critical is set and critical findings exist
const CRITICAL_EXIT_CODE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "crossval",
    version,
    about = "Reconcile a tabular backtest export with its nested metrics document"
)]
struct Cli {
    /// Tabular (CSV) backtest export
    #[arg(long)]
    csv: PathBuf,

    /// Nested metrics document (JSON)
    #[arg(long)]
    json: PathBuf,

    /// Write the report here (format inferred from extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format: json or markdown
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    trade_count_tolerance: Option<f64>,

    #[arg(long)]
    performance_tolerance: Option<f64>,

    #[arg(long)]
    risk_tolerance: Option<f64>,

    #[arg(long)]
    allocation_tolerance: Option<f64>,

    #[arg(long)]
    unit_tolerance: Option<f64>,

    /// Exit with status 2 when any critical check fails
    #[arg(long)]
    fail_on_critical: bool,
}

impl Cli {
    fn tolerance_overrides(&self) -> ToleranceOverrides {
        ToleranceOverrides {
            trade_count: self.trade_count_tolerance,
            performance: self.performance_tolerance,
            risk: self.risk_tolerance,
            allocation: self.allocation_tolerance,
            unit_consistency: self.unit_tolerance,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    setup_logging(&settings.logging.filter);

    let nested = NestedMetrics::from_path(&cli.json)
        .with_context(|| format!("Failed to load nested metrics from {}", cli.json.display()))?;

    let output_path = cli.output.clone().or(settings.report.output_path.clone());
    let generate_report =
        output_path.is_some() && (cli.output.is_some() || settings.report.generate);
    let format = cli.format.or(settings.report.format);

    let mut config = CrossValidationConfig::new(&cli.csv, nested)
        .with_tolerances(settings.tolerances.clone().merge(cli.tolerance_overrides()));
    config.output_path = output_path;
    config.generate_report = generate_report;
    config.format = format;

    let report = CsvJsonCrossValidator::new()
        .cross_validate(&config)
        .with_context(|| format!("Cross-validation of {} failed", cli.csv.display()))?;

    if generate_report {
        print_summary(&report);
    } else {
        let rendered = render(&report, format.unwrap_or(ReportFormat::Markdown))?;
        println!("{}", rendered);
    }

    if cli.fail_on_critical && report.validation_summary.has_critical() {
        std::process::exit(CRITICAL_EXIT_CODE);
    }

    Ok(())
}

fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(report: &CrossValidationReport) {
    let summary = &report.validation_summary;

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              CROSS-VALIDATION SUMMARY                 ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    println!("  Source:                {}", report.source);
    println!("  Data Quality Score:    {:.2}", report.data_quality_score);
    println!(
        "  Checks:                {}/{} passed ({:.1}%)",
        summary.passed,
        summary.total,
        summary.success_rate * 100.0
    );
    println!("  Critical:              {}", summary.critical);
    println!("  Warnings:              {}", summary.warning);

    let failed_entities: Vec<&str> = report
        .failed_entities()
        .map(|e| e.entity.as_str())
        .collect();
    if !failed_entities.is_empty() {
        println!("  Entities off-tolerance: {}", failed_entities.join(", "));
    }

    if !report.portfolio_issues.is_empty() {
        println!("\n⚠️  PORTFOLIO ISSUES");
        for issue in &report.portfolio_issues {
            println!("  - {}", issue);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\n🔧 RECOMMENDATIONS");
        for (i, rec) in report.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, rec);
        }
    }

    println!("\n═══════════════════════════════════════════════════════\n");
}
