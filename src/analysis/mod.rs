//! Analysis façade and result types
//!
//! - Result types shared by every pipeline stage
//! - Timing telemetry collaborator
//! - The scan façade hosts call into

pub mod metrics;
pub mod result;
pub mod scanner;

pub use metrics::MetricsSink;
pub use scanner::{AnalysisHints, Analyzer};
