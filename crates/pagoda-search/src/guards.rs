//! Knowledge- and structure-aware checks applied before writing a mark.

use std::fmt;

use pagoda_core::{BackgroundKnowledge, TargetKind, Variable};
use pagoda_graph::{paths, CausalGraph, Endpoint};

/// Why a collider orientation was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// One of the two edges no longer exists.
    EdgeMissing,
    /// Knowledge or a fixed tail forbids an arrowhead at the middle node.
    ArrowheadDisallowed,
    /// The middle node is already an ancestor of an outer node.
    MiddleIsAncestor,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeMissing => f.write_str("edge missing"),
            Self::ArrowheadDisallowed => f.write_str("arrowhead not allowed"),
            Self::MiddleIsAncestor => f.write_str("middle node is an ancestor"),
        }
    }
}

/// May an arrowhead be placed at `y` on the edge `x *-* y`?
///
/// An existing arrowhead is always fine. A tail is fixed, except that an
/// undirected CPDAG edge may still be oriented. Knowledge rules out `y --> x`
/// being required and `x --> y` being forbidden (unless `x` already carries
/// an arrowhead, which makes the edge bidirected rather than `x --> y`).
pub fn is_arrowhead_allowed(
    graph: &CausalGraph,
    knowledge: &dyn BackgroundKnowledge,
    target: TargetKind,
    x: &Variable,
    y: &Variable,
) -> bool {
    let (Some(at_y), Some(at_x)) = (graph.endpoint(x, y), graph.endpoint(y, x)) else {
        return false;
    };
    match at_y {
        Endpoint::Arrow => return true,
        Endpoint::Tail if !(target == TargetKind::Cpdag && at_x == Endpoint::Tail) => return false,
        _ => {}
    }
    if knowledge.is_required(y, x) {
        return false;
    }
    if knowledge.is_forbidden(x, y) && at_x != Endpoint::Arrow {
        return false;
    }
    true
}

/// Preconditions for writing the collider `x *-> z <-* y`. The middle node
/// must not reach either outer node along a directed path, or the new
/// arrowheads would close a cycle.
pub fn collider_guard(
    graph: &CausalGraph,
    knowledge: &dyn BackgroundKnowledge,
    target: TargetKind,
    x: &Variable,
    z: &Variable,
    y: &Variable,
) -> Result<(), BlockReason> {
    if !graph.is_adjacent(x, z) || !graph.is_adjacent(y, z) {
        return Err(BlockReason::EdgeMissing);
    }
    if !is_arrowhead_allowed(graph, knowledge, target, x, z)
        || !is_arrowhead_allowed(graph, knowledge, target, y, z)
    {
        return Err(BlockReason::ArrowheadDisallowed);
    }
    if paths::is_ancestor_of(graph, z, x) || paths::is_ancestor_of(graph, z, y) {
        return Err(BlockReason::MiddleIsAncestor);
    }
    Ok(())
}

/// Checks for orienting an undirected CPDAG edge `from --> to`: knowledge
/// must allow it, it must not close a directed cycle, and it must not create
/// an unshielded collider at `to` that was not decided as one.
pub fn can_orient_directed(
    graph: &CausalGraph,
    knowledge: &dyn BackgroundKnowledge,
    from: &Variable,
    to: &Variable,
) -> bool {
    if knowledge.is_forbidden(from, to) || knowledge.is_required(to, from) {
        return false;
    }
    if paths::would_create_cycle(graph, from, to) {
        return false;
    }
    !creates_new_collider(graph, from, to)
}

/// Would `from --> to` form an unrecorded unshielded collider at `to`?
pub fn creates_new_collider(graph: &CausalGraph, from: &Variable, to: &Variable) -> bool {
    graph.parents(to).iter().any(|w| {
        w != from && !graph.is_adjacent(w, from) && !graph.is_collider_triple(from, to, w)
    })
}
