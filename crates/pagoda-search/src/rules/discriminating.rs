//! FCI rule R4: discriminating paths.

use std::collections::{HashMap, HashSet, VecDeque};

use pagoda_core::Variable;
use pagoda_graph::{CausalGraph, Endpoint};

/// A discriminating path `<d, ..., a, b, c>` for `b`: every node strictly
/// between `d` and `b` is a collider on the path and a parent of `c`, and
/// `d` is not adjacent to `c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatingPath {
    pub d: Variable,
    /// Nodes strictly between `d` and `b`, nearest to `d` first.
    pub interior: Vec<Variable>,
    pub b: Variable,
    pub c: Variable,
}

/// How R4 should rewrite `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// `b` separates `d` and `c`: `b --> c`.
    Noncollider,
    /// `a <-> b <-> c`.
    Collider,
}

/// Every `(a, c)` around `b` that could end a discriminating path:
/// `a <-* b o-> c` with `a --> c`.
pub fn candidate_ends(graph: &CausalGraph, b: &Variable) -> Vec<(Variable, Variable)> {
    let mut ends = Vec::new();
    for a in graph.adjacent(b) {
        if graph.endpoint(b, &a) != Some(Endpoint::Arrow) {
            continue;
        }
        for c in graph.nodes_into(b, Endpoint::Circle) {
            if c == a || graph.endpoint(b, &c) != Some(Endpoint::Arrow) {
                continue;
            }
            if graph.is_parent_of(&a, &c) {
                ends.push((a.clone(), c));
            }
        }
    }
    ends
}

/// Breadth-first search back from `a` for discriminating paths for `b`, with
/// at most `max_length` nodes strictly between `d` and `b`. Each path found
/// is handed to `decide`, nearest `d` first; the search stops at the first
/// path `decide` accepts and keeps going past the ones it rejects.
pub fn find_discriminating_path<T>(
    graph: &CausalGraph,
    a: &Variable,
    b: &Variable,
    c: &Variable,
    max_length: usize,
    mut decide: impl FnMut(&DiscriminatingPath) -> Option<T>,
) -> Option<(DiscriminatingPath, T)> {
    let c_parents: HashSet<Variable> = graph.parents(c).into_iter().collect();
    let mut previous: HashMap<Variable, Variable> = HashMap::new();
    let mut distance: HashMap<Variable, usize> = HashMap::new();
    let mut visited: HashSet<Variable> = HashSet::new();
    let mut queue: VecDeque<Variable> = VecDeque::new();

    previous.insert(a.clone(), b.clone());
    distance.insert(a.clone(), 1);
    visited.insert(a.clone());
    visited.insert(b.clone());
    visited.insert(c.clone());
    queue.push_back(a.clone());

    while let Some(t) = queue.pop_front() {
        let dist = distance.get(&t).copied().unwrap_or(0);
        if dist > max_length {
            continue;
        }
        let before_t = previous.get(&t).cloned()?;
        for d in graph.nodes_into(&t, Endpoint::Arrow) {
            if visited.contains(&d) || !graph.is_def_collider(&d, &t, &before_t) {
                continue;
            }
            if !graph.is_adjacent(&d, c) {
                let path = DiscriminatingPath {
                    interior: interior(&previous, &t, b),
                    d,
                    b: b.clone(),
                    c: c.clone(),
                };
                if let Some(verdict) = decide(&path) {
                    return Some((path, verdict));
                }
                continue;
            }
            if c_parents.contains(&d) {
                previous.insert(d.clone(), t.clone());
                visited.insert(d.clone());
                distance.insert(d.clone(), dist + 1);
                queue.push_back(d);
            }
        }
    }
    None
}

/// Walk `previous` from `from` back to (not including) `stop`.
fn interior(previous: &HashMap<Variable, Variable>, from: &Variable, stop: &Variable) -> Vec<Variable> {
    let mut path = Vec::new();
    let mut current = from.clone();
    while &current != stop {
        path.push(current.clone());
        match previous.get(&current) {
            Some(p) => current = p.clone(),
            None => break,
        }
    }
    path
}
