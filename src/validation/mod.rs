pub mod outcome;
pub mod portfolio;
pub mod tolerances;

pub use outcome::{CheckOutcome, ValidationSummary};
pub use portfolio::PortfolioMetricsValidator;
pub use tolerances::{ToleranceOverrides, Tolerances};
