//! Orientation rules applied after collider orientation.
//!
//! - [`knowledge`]: background-knowledge orientation.
//! - [`meek`]: Meek R1-R4 for CPDAG targets.
//! - [`fci`]: FCI R1-R10 for PAG targets, with R4 in [`discriminating`].

pub mod discriminating;
pub mod fci;
pub mod knowledge;
pub mod meek;

use pagoda_core::events::EdgeOrientedEvent;
use pagoda_core::{HaltReason, Variable};
use pagoda_graph::CausalGraph;
use tracing::debug;

use crate::context::SearchContext;

pub use fci::FciRules;
pub use knowledge::orient_by_knowledge;
pub use meek::MeekRules;

/// Outcome of running a rule engine to its fixed point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReport {
    /// Endpoint rewrites performed.
    pub changes: usize,
    pub iterations: usize,
    /// False when the iteration bound was hit first.
    pub converged: bool,
    pub halted: Option<HaltReason>,
}

/// Log and publish one rewrite of edge `a - b`.
pub(crate) fn announce(ctx: &SearchContext, graph: &CausalGraph, a: &Variable, b: &Variable, rule: &'static str) {
    let edge = graph
        .edge(a, b)
        .map(|e| e.to_string())
        .unwrap_or_else(|| format!("{a} - {b}"));
    debug!(edge = %edge, rule, "edge oriented");
    ctx.events().emit_edge_oriented(&EdgeOrientedEvent { edge, rule });
}
