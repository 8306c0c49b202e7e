//! Calculation orchestration: configuration, report and pipeline

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::CalculationConfig;
pub use pipeline::CalculationPipeline;
pub use report::{CalculationReport, EducationalNote};
