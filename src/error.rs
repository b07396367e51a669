//! Error types for the analysis pipeline

use std::fmt;

/// Errors that can occur during analysis
///
/// None of these reach the scan façade's callers: [`crate::Analyzer`] logs
/// them and returns a sentinel instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Empty window, zero sample rate/channels, malformed parameters
    InvalidInput(String),

    /// Not enough novelty frames or beats to support the analysis
    InsufficientData(String),

    /// Failure in a lower layer (FFT planning, buffer provider, ...)
    ProcessingError(String),

    /// Numerical error (NaN, overflow, ...)
    NumericalError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = AnalysisError::InsufficientData("3 beats".to_string());
        assert_eq!(err.to_string(), "Insufficient data: 3 beats");

        let err = AnalysisError::InvalidInput("empty window".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty window");
    }
}
