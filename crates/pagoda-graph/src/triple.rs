//! Unshielded triples.

use std::fmt;

use pagoda_core::Variable;
use serde::{Deserialize, Serialize};

use crate::graph::CausalGraph;

/// A triple `<x, z, y>` with `z` in the middle, stored with `x <= y` by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub x: Variable,
    pub z: Variable,
    pub y: Variable,
}

impl Triple {
    /// Canonicalizes so the outer nodes are in name order.
    pub fn new(x: Variable, z: Variable, y: Variable) -> Self {
        if x <= y {
            Self { x, z, y }
        } else {
            Self { x: y, z, y: x }
        }
    }

    pub fn of(x: &Variable, z: &Variable, y: &Variable) -> Self {
        Self::new(x.clone(), z.clone(), y.clone())
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.z, self.y)
    }
}

/// All unshielded triples of `graph`, sorted by `(x, z, y)`.
pub fn unshielded_triples(graph: &CausalGraph) -> Vec<Triple> {
    let mut triples = Vec::new();
    for z in graph.variables() {
        let adj = graph.adjacent(&z);
        for (i, x) in adj.iter().enumerate() {
            for y in &adj[i + 1..] {
                if !graph.is_adjacent(x, y) {
                    triples.push(Triple::of(x, &z, y));
                }
            }
        }
    }
    triples.sort();
    triples
}

/// Unshielded triples centred on `z`.
pub fn unshielded_triples_at(graph: &CausalGraph, z: &Variable) -> Vec<Triple> {
    let adj = graph.adjacent(z);
    let mut triples = Vec::new();
    for (i, x) in adj.iter().enumerate() {
        for y in &adj[i + 1..] {
            if !graph.is_adjacent(x, y) {
                triples.push(Triple::of(x, z, y));
            }
        }
    }
    triples
}
