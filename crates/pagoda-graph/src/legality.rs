//! Legality predicates for search output.

use std::fmt;

use pagoda_core::{BackgroundKnowledge, TargetKind, Variable};

use crate::endpoint::Endpoint;
use crate::graph::CausalGraph;
use crate::paths;

/// One reason a graph is not a legal member of its target class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegalityIssue {
    DirectedCycle { nodes: Vec<Variable> },
    AlmostDirectedCycle { a: Variable, b: Variable },
    /// A mark the target class does not allow (circles or `<->` in a CPDAG).
    UnexpectedMark { edge: String },
    ForbiddenEdgeOriented { from: Variable, to: Variable },
    RequiredEdgeNotOriented { from: Variable, to: Variable },
}

impl fmt::Display for LegalityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectedCycle { nodes } => {
                let names: Vec<&str> = nodes.iter().map(Variable::name).collect();
                write!(f, "directed cycle among [{}]", names.join(", "))
            }
            Self::AlmostDirectedCycle { a, b } => {
                write!(f, "almost directed cycle through {a} <-> {b}")
            }
            Self::UnexpectedMark { edge } => write!(f, "edge {edge} not allowed in target class"),
            Self::ForbiddenEdgeOriented { from, to } => {
                write!(f, "forbidden edge {from} --> {to} present")
            }
            Self::RequiredEdgeNotOriented { from, to } => {
                write!(f, "required edge {from} --> {to} not oriented")
            }
        }
    }
}

/// Every legality problem of `graph` as a member of `target`.
pub fn check_legality(
    graph: &CausalGraph,
    target: TargetKind,
    knowledge: &dyn BackgroundKnowledge,
) -> Vec<LegalityIssue> {
    let mut issues: Vec<LegalityIssue> = paths::find_directed_cycles(graph)
        .into_iter()
        .map(|nodes| LegalityIssue::DirectedCycle { nodes })
        .collect();

    match target {
        TargetKind::Cpdag => {
            for edge in graph.edges() {
                let has_circle =
                    edge.endpoint1 == Endpoint::Circle || edge.endpoint2 == Endpoint::Circle;
                if has_circle || edge.is_bidirected() {
                    issues.push(LegalityIssue::UnexpectedMark {
                        edge: edge.to_string(),
                    });
                }
            }
        }
        TargetKind::Pag => {
            issues.extend(
                paths::find_almost_directed_cycles(graph)
                    .into_iter()
                    .map(|(a, b)| LegalityIssue::AlmostDirectedCycle { a, b }),
            );
        }
    }

    for edge in graph.edges() {
        for (from, to) in [(&edge.node1, &edge.node2), (&edge.node2, &edge.node1)] {
            let is_oriented = graph.is_parent_of(from, to);
            if is_oriented && knowledge.is_forbidden(from, to) {
                issues.push(LegalityIssue::ForbiddenEdgeOriented {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            if knowledge.is_required(from, to) && !is_oriented {
                issues.push(LegalityIssue::RequiredEdgeNotOriented {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
    }

    issues
}

pub fn is_legal(graph: &CausalGraph, target: TargetKind, knowledge: &dyn BackgroundKnowledge) -> bool {
    check_legality(graph, target, knowledge).is_empty()
}
