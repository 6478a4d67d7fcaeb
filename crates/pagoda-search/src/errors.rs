//! Search errors.

use pagoda_core::errors::error_code::{self, PagodaErrorCode};
use pagoda_core::events::SearchPhase;
use pagoda_core::{ConfigError, GraphError, KnowledgeError};

use crate::outcome::SearchOutcome;

/// Errors returned by [`crate::search`].
///
/// `Interrupted` and `TimedOut` still carry the best-effort result reached
/// before the search stopped.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("search cancelled during {phase}")]
    Interrupted {
        phase: SearchPhase,
        partial: Box<SearchOutcome>,
    },

    #[error("search timed out during {phase}")]
    TimedOut {
        phase: SearchPhase,
        partial: Box<SearchOutcome>,
    },
}

impl SearchError {
    /// The partial result of an interrupted or timed-out search.
    pub fn partial(&self) -> Option<&SearchOutcome> {
        match self {
            Self::Interrupted { partial, .. } | Self::TimedOut { partial, .. } => Some(partial),
            _ => None,
        }
    }

    pub fn into_partial(self) -> Option<SearchOutcome> {
        match self {
            Self::Interrupted { partial, .. } | Self::TimedOut { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}

impl PagodaErrorCode for SearchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => error_code::INVALID_INPUT,
            Self::Knowledge(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Graph(e) => e.error_code(),
            Self::Interrupted { .. } => error_code::INTERRUPTED,
            Self::TimedOut { .. } => error_code::TIMED_OUT,
        }
    }
}
