//! Background knowledge errors.

use super::error_code::{self, PagodaErrorCode};

/// Contradictions found when validating background knowledge.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("edge {from} -> {to} is required in both directions")]
    RequiredBothWays { from: String, to: String },

    #[error("edge {from} -> {to} is both required and forbidden")]
    RequiredAndForbidden { from: String, to: String },

    #[error("required edge {from} -> {to} points from tier {from_tier} back to tier {to_tier}")]
    RequiredAgainstTiers {
        from: String,
        to: String,
        from_tier: usize,
        to_tier: usize,
    },

    #[error("self-referencing constraint on {variable}")]
    SelfLoop { variable: String },

    #[error("knowledge parse error: {message}")]
    Parse { message: String },
}

impl PagodaErrorCode for KnowledgeError {
    fn error_code(&self) -> &'static str {
        error_code::KNOWLEDGE_CONFLICT
    }
}
