//! Event payload types.

use std::fmt;

use crate::errors::OracleError;
use crate::variable::Variable;

/// Phases of a search, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchPhase {
    Skeleton,
    Colliders,
    PossibleDsep,
    Rules,
    Repair,
}

impl SearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skeleton => "skeleton",
            Self::Colliders => "colliders",
            Self::PossibleDsep => "possible_dsep",
            Self::Rules => "rules",
            Self::Repair => "repair",
        }
    }
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for `on_phase_started`.
#[derive(Debug, Clone)]
pub struct PhaseStartedEvent {
    pub phase: SearchPhase,
}

/// Payload for `on_phase_finished`.
#[derive(Debug, Clone)]
pub struct PhaseFinishedEvent {
    pub phase: SearchPhase,
    pub duration_ms: u64,
}

/// Payload for `on_edge_removed`.
#[derive(Debug, Clone)]
pub struct EdgeRemovedEvent {
    pub x: Variable,
    pub y: Variable,
    pub sepset: Vec<Variable>,
    pub p_value: f64,
    pub phase: SearchPhase,
}

/// Payload for `on_triple_decided`.
#[derive(Debug, Clone)]
pub struct TripleDecidedEvent {
    pub x: Variable,
    pub z: Variable,
    pub y: Variable,
    pub decision: &'static str,
    pub oriented: bool,
}

/// Payload for `on_edge_oriented`.
#[derive(Debug, Clone)]
pub struct EdgeOrientedEvent {
    pub edge: String,
    pub rule: &'static str,
}

/// Payload for `on_oracle_failure`.
#[derive(Debug, Clone)]
pub struct OracleFailureEvent {
    pub x: Variable,
    pub y: Variable,
    pub conditioning: Vec<Variable>,
    pub error: OracleError,
}

/// Payload for `on_warning`.
#[derive(Debug, Clone)]
pub struct WarningEvent {
    pub message: String,
}
