//! Orientation forced by background knowledge.

use pagoda_core::{BackgroundKnowledge, TargetKind};
use pagoda_graph::{CausalGraph, Endpoint};

/// Apply required and forbidden directions to the edges present in `graph`.
///
/// CPDAG: required `a -> b` orients `a --> b`; forbidden `a -> b` on an
/// undirected edge orients `b --> a` unless that is forbidden too.
/// PAG: forbidden `a -> b` puts an arrowhead at `a`; required `a -> b`
/// writes `a --> b`. Returns the number of edges changed.
pub fn orient_by_knowledge(
    graph: &mut CausalGraph,
    knowledge: &dyn BackgroundKnowledge,
    target: TargetKind,
) -> usize {
    if knowledge.is_empty() {
        return 0;
    }
    let mut changed = 0;
    for (x, y) in graph.adjacent_pairs() {
        for (from, to) in [(&x, &y), (&y, &x)] {
            if knowledge.is_required(from, to) {
                if graph.set_directed(from, to) {
                    changed += 1;
                }
                continue;
            }
            if !knowledge.is_forbidden(from, to) {
                continue;
            }
            let rewritten = match target {
                TargetKind::Cpdag => {
                    let undirected = graph.endpoint(from, to) == Some(Endpoint::Tail)
                        && graph.endpoint(to, from) == Some(Endpoint::Tail);
                    undirected && !knowledge.is_forbidden(to, from) && graph.set_directed(to, from)
                }
                TargetKind::Pag => graph.set_endpoint(to, from, Endpoint::Arrow),
            };
            if rewritten {
                changed += 1;
            }
        }
    }
    if changed > 0 {
        tracing::debug!(changed, "edges oriented from knowledge");
    }
    changed
}
