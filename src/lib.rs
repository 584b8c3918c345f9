// Core modules
pub mod engine;
pub mod error;
pub mod models;
pub mod nested;
pub mod report;
pub mod settings;
pub mod synthetic;
pub mod tabular;
pub mod validation;

// Re-export commonly used types
pub use engine::{
    CrossValidationConfig, CrossValidationReport, CsvJsonCrossValidator, EntityComparison,
    MetricComparison,
};
pub use models::*;
pub use nested::NestedMetrics;
pub use report::ReportFormat;
pub use tabular::TabularSource;
pub use validation::{
    CheckOutcome, PortfolioMetricsValidator, ToleranceOverrides, Tolerances, ValidationSummary,
};

// Error handling
pub use error::{Error, Result};
