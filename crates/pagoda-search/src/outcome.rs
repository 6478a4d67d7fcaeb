//! What a search returns.

use std::fmt;

use pagoda_core::events::SearchPhase;
use pagoda_core::variable::format_set;
use pagoda_core::HaltReason;
use pagoda_graph::{CausalGraph, LegalityIssue, Triple};
use serde::Serialize;

use crate::colliders::DecisionRecord;
use crate::sepsets::SepsetMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Completed,
    Cancelled,
    TimedOut,
}

impl From<HaltReason> for SearchStatus {
    fn from(reason: HaltReason) -> Self {
        match reason {
            HaltReason::Cancelled => Self::Cancelled,
            HaltReason::TimedOut => Self::TimedOut,
        }
    }
}

/// Non-fatal conditions attached to an outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchWarning {
    /// Oracle calls that failed and were treated as dependent.
    OracleDegraded { count: usize },
    NotConverged { phase: SearchPhase, iterations: usize },
    /// The graph is not a legal member of its target class.
    IllegalOutput { issues: Vec<LegalityIssue> },
    /// Repair found a legal graph by flipping these triples.
    RepairApplied { flipped: Vec<Triple> },
}

impl fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OracleDegraded { count } => {
                write!(f, "{count} independence tests failed and were treated as dependent")
            }
            Self::NotConverged { phase, iterations } => {
                write!(f, "{phase} did not converge after {iterations} iterations")
            }
            Self::IllegalOutput { issues } => {
                let parts: Vec<String> = issues.iter().map(ToString::to_string).collect();
                write!(f, "output is not legal: {}", parts.join("; "))
            }
            Self::RepairApplied { flipped } => {
                let parts: Vec<String> = flipped.iter().map(ToString::to_string).collect();
                write!(f, "repaired by flipping {}", parts.join(", "))
            }
        }
    }
}

/// Counters gathered over one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub tests_run: usize,
    pub cache_hits: usize,
    pub degraded: usize,
    pub edges_removed: usize,
    pub depth_reached: Option<usize>,
    pub colliders_oriented: usize,
    pub rule_orientations: usize,
    pub elapsed_ms: u64,
}

/// The final (or best-effort) graph with everything learned on the way.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub graph: CausalGraph,
    pub sepsets: SepsetMap,
    /// One record per unshielded triple of the last collider pass.
    pub decisions: Vec<DecisionRecord>,
    pub status: SearchStatus,
    pub warnings: Vec<SearchWarning>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == SearchStatus::Completed
    }

    /// Sorted display strings of the graph's edges.
    pub fn edge_strings(&self) -> Vec<String> {
        self.graph.edge_strings()
    }

    pub fn decision_for(&self, triple: &Triple) -> Option<&DecisionRecord> {
        self.decisions.iter().find(|r| &r.triple == triple)
    }

    /// Human-readable separating sets, one line per removed pair.
    pub fn sepset_lines(&self) -> Vec<String> {
        self.sepsets
            .pairs()
            .filter_map(|(x, y)| {
                self.sepsets
                    .get(x, y)
                    .map(|set| format!("{x} _||_ {y} | {}", format_set(set)))
            })
            .collect()
    }
}
