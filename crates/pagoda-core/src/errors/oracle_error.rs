//! Independence oracle errors.

use super::error_code::{self, PagodaErrorCode};

/// Failures reported by an independence oracle.
///
/// The engine never aborts on these: a failed test is treated as
/// "dependent" and surfaced through a warning event.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("independence test failed: {reason}")]
    Failed { reason: String },

    #[error("independence test timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("unsupported query: {reason}")]
    Unsupported { reason: String },
}

impl PagodaErrorCode for OracleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Failed { .. } => error_code::ORACLE_FAILED,
            Self::Timeout { .. } => error_code::ORACLE_TIMEOUT,
            Self::Unsupported { .. } => error_code::ORACLE_UNSUPPORTED,
        }
    }
}
