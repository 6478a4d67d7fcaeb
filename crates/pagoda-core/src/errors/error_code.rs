//! Stable machine-readable error codes.

/// Every error enum implements this to expose a structured code string
/// that callers can match on without parsing messages.
pub trait PagodaErrorCode {
    /// Returns the error code (e.g., "ORACLE_FAILED").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const KNOWLEDGE_CONFLICT: &str = "KNOWLEDGE_CONFLICT";
pub const GRAPH_ERROR: &str = "GRAPH_ERROR";
pub const ORACLE_FAILED: &str = "ORACLE_FAILED";
pub const ORACLE_TIMEOUT: &str = "ORACLE_TIMEOUT";
pub const ORACLE_UNSUPPORTED: &str = "ORACLE_UNSUPPORTED";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const INTERRUPTED: &str = "INTERRUPTED";
pub const TIMED_OUT: &str = "TIMED_OUT";
