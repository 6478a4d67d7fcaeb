//! Causal graph errors.

use super::error_code::{self, PagodaErrorCode};

/// Structural errors raised by graph mutations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("duplicate variable: {name}")]
    DuplicateVariable { name: String },

    #[error("self-loop on {name} is not allowed")]
    SelfLoop { name: String },

    #[error("edge {a} - {b} already exists")]
    DuplicateEdge { a: String, b: String },

    #[error("no edge between {a} and {b}")]
    MissingEdge { a: String, b: String },
}

impl PagodaErrorCode for GraphError {
    fn error_code(&self) -> &'static str {
        error_code::GRAPH_ERROR
    }
}
