//! Configuration errors.

use super::error_code::{self, PagodaErrorCode};

/// A search configuration that could not be read or is out of range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("search config {path} does not exist")]
    FileNotFound { path: String },

    #[error("search config {path} is not valid TOML: {message}")]
    ParseError { path: String, message: String },

    /// `field` names the offending `SearchConfig` field.
    #[error("search config field `{field}` rejected: {message}")]
    ValidationFailed { field: String, message: String },
}

impl PagodaErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
