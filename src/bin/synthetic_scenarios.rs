use crossval::synthetic::{ArtifactScenario, SyntheticArtifactGenerator};
use crossval::{CrossValidationReport, CsvJsonCrossValidator, Tolerances};

const SEED: u64 = 42;
const ENTITIES: usize = 8;
const ROWS_PER_ENTITY: usize = 3;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("crossval=warn")
        .init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║        CROSS-VALIDATION SYNTHETIC SCENARIOS           ║");
    println!("╚═══════════════════════════════════════════════════════╝");

    let validator = CsvJsonCrossValidator::new();
    let mut results = Vec::new();

    for scenario in ArtifactScenario::ALL {
        let mut generator = SyntheticArtifactGenerator::new(SEED);
        let (rows, nested) = generator.generate(scenario, ENTITIES, ROWS_PER_ENTITY);

        let report = validator.reconcile(
            scenario.description(),
            &rows,
            &nested,
            Tolerances::default(),
        );
        results.push((scenario.description(), report));
    }

    print_summary_comparison(&results);
}

fn print_summary_comparison(results: &[(&str, CrossValidationReport)]) {
    println!(
        "\n{:<28} {:>7} {:>8} {:>9} {:>8} {:>7}",
        "Scenario", "Score", "Passed", "Critical", "Warning", "Issues"
    );
    println!("{}", "─".repeat(72));

    for (name, report) in results {
        let summary = &report.validation_summary;
        println!(
            "{:<28} {:>7.2} {:>4}/{:<3} {:>9} {:>8} {:>7}",
            name,
            report.data_quality_score,
            summary.passed,
            summary.total,
            summary.critical,
            summary.warning,
            report.portfolio_issues.len()
        );
    }

    for (name, report) in results {
        if report.recommendations.is_empty() {
            continue;
        }
        println!("\n🔧 {}", name);
        for rec in &report.recommendations {
            println!("   - {}", rec);
        }
    }

    println!("\n═══════════════════════════════════════════════════════\n");
}
