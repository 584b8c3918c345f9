pub mod anomaly;
pub mod comparison;
pub mod recommend;
pub mod report;
pub mod validator;

pub use anomaly::{detect_anomalies, AnomalyFindings};
pub use comparison::{compare_entities, EntityComparison, MetricComparison};
pub use recommend::{composite_score, synthesize};
pub use report::CrossValidationReport;
pub use validator::{CrossValidationConfig, CsvJsonCrossValidator};
