//! Bounded repair of an illegal output by flipping collider decisions.

use std::collections::BTreeSet;
use std::time::Instant;

use pagoda_core::events::{PhaseFinishedEvent, PhaseStartedEvent, SearchPhase, WarningEvent};
use pagoda_core::{BackgroundKnowledge, TargetKind};
use pagoda_graph::{is_legal, CausalGraph, Triple};
use tracing::{debug, info, warn};

use crate::context::SearchContext;
use crate::sepsets::Subsets;

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The first legal graph found, or the input graph when none was.
    pub graph: CausalGraph,
    pub repaired: bool,
    /// Triples whose collider status was flipped to reach `graph`.
    pub flipped: Vec<Triple>,
    pub attempts: usize,
}

/// Candidate triples are the ambiguous triples plus the oriented colliders
/// of `graph`. Subsets of size `1..=bound` are tried in lexicographic order;
/// flipping a triple toggles its membership in the collider set, and
/// `reorient` rebuilds a graph from that set. The first legal result wins.
pub fn repair<F>(
    graph: &CausalGraph,
    target: TargetKind,
    knowledge: &dyn BackgroundKnowledge,
    bound: usize,
    ctx: &SearchContext,
    mut reorient: F,
) -> RepairOutcome
where
    F: FnMut(&BTreeSet<Triple>) -> CausalGraph,
{
    let started = Instant::now();
    ctx.events().emit_phase_started(&PhaseStartedEvent {
        phase: SearchPhase::Repair,
    });

    let colliders: BTreeSet<Triple> = graph.collider_triples().clone();
    let candidates: Vec<Triple> = graph
        .ambiguous_triples()
        .iter()
        .chain(colliders.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut outcome = RepairOutcome {
        graph: graph.clone(),
        repaired: false,
        flipped: Vec::new(),
        attempts: 0,
    };

    'sizes: for size in 1..=bound.min(candidates.len()) {
        for flip in Subsets::new(&candidates, size) {
            if ctx.check().is_err() {
                break 'sizes;
            }
            let mut chosen = colliders.clone();
            for t in &flip {
                if !chosen.remove(t) {
                    chosen.insert(t.clone());
                }
            }
            outcome.attempts += 1;
            let candidate = reorient(&chosen);
            if is_legal(&candidate, target, knowledge) {
                debug!(size, attempts = outcome.attempts, "legal graph found");
                outcome.graph = candidate;
                outcome.repaired = true;
                outcome.flipped = flip;
                break 'sizes;
            }
        }
    }

    if outcome.repaired {
        info!(flipped = outcome.flipped.len(), attempts = outcome.attempts, "output repaired");
    } else {
        warn!(attempts = outcome.attempts, "no legal graph within repair bound");
        ctx.events().emit_warning(&WarningEvent {
            message: format!("no legal graph found after {} repair attempts", outcome.attempts),
        });
    }
    ctx.events().emit_phase_finished(&PhaseFinishedEvent {
        phase: SearchPhase::Repair,
        duration_ms: started.elapsed().as_millis() as u64,
    });
    outcome
}
