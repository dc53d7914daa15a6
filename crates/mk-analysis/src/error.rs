//! Error types for the analysis engine
//!
//! Only input validation is fatal to a call. Numeric edge cases inside
//! feature extraction and detection degrade to sentinel values instead
//! of erroring; detector-internal problems become Info issues.

use thiserror::Error;

/// Analysis error type
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input buffer failed validation
    #[error(transparent)]
    Input(#[from] mk_core::CoreError),

    /// Internal analysis failure
    #[error("Analysis error: {0}")]
    Internal(String),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
