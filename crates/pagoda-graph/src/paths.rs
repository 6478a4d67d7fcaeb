//! Path queries: directed reachability, cycles, possible-d-sep, and the
//! uncovered / potentially directed paths used by the complete FCI rules.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use pagoda_core::Variable;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::endpoint::Endpoint;
use crate::graph::CausalGraph;

type Projection = (DiGraph<Variable, ()>, BTreeMap<Variable, NodeIndex>);

/// Project the directed (`-->`) edges onto a petgraph `DiGraph`.
fn directed_projection(graph: &CausalGraph) -> Projection {
    let mut digraph = DiGraph::new();
    let mut index = BTreeMap::new();
    for v in graph.variables() {
        let idx = digraph.add_node(v.clone());
        index.insert(v, idx);
    }
    for edge in graph.edges() {
        let (from, to) = match (edge.endpoint1, edge.endpoint2) {
            (Endpoint::Tail, Endpoint::Arrow) => (&edge.node1, &edge.node2),
            (Endpoint::Arrow, Endpoint::Tail) => (&edge.node2, &edge.node1),
            _ => continue,
        };
        if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
            digraph.add_edge(a, b, ());
        }
    }
    (digraph, index)
}

/// Strongly connected components of the directed part with more than one
/// node. Each one contains a directed cycle.
pub fn find_directed_cycles(graph: &CausalGraph) -> Vec<Vec<Variable>> {
    let (digraph, _) = directed_projection(graph);
    tarjan_scc(&digraph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<Variable> = scc.into_iter().map(|i| digraph[i].clone()).collect();
            names.sort();
            names
        })
        .collect()
}

pub fn has_directed_cycle(graph: &CausalGraph) -> bool {
    !find_directed_cycles(graph).is_empty()
}

/// True if `from --> ... --> to` exists (a zero-length path counts).
pub fn exists_directed_path(graph: &CausalGraph, from: &Variable, to: &Variable) -> bool {
    if from == to {
        return true;
    }
    let mut visited: HashSet<Variable> = HashSet::new();
    let mut queue: VecDeque<Variable> = VecDeque::new();
    visited.insert(from.clone());
    queue.push_back(from.clone());

    while let Some(current) = queue.pop_front() {
        for child in graph.children(&current) {
            if &child == to {
                return true;
            }
            if visited.insert(child.clone()) {
                queue.push_back(child);
            }
        }
    }
    false
}

/// True if `a` is an ancestor of `b` (or equal to it).
pub fn is_ancestor_of(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    exists_directed_path(graph, a, b)
}

/// Whether orienting `from --> to` would close a directed cycle.
pub fn would_create_cycle(graph: &CausalGraph, from: &Variable, to: &Variable) -> bool {
    exists_directed_path(graph, to, from)
}

/// Bidirected edges `a <-> b` where one endpoint is an ancestor of the other.
pub fn find_almost_directed_cycles(graph: &CausalGraph) -> Vec<(Variable, Variable)> {
    graph
        .edges()
        .into_iter()
        .filter(|e| e.is_bidirected())
        .filter(|e| {
            exists_directed_path(graph, &e.node1, &e.node2)
                || exists_directed_path(graph, &e.node2, &e.node1)
        })
        .map(|e| (e.node1, e.node2))
        .collect()
}

/// Possible-D-Sep(x): nodes reachable from `x` by a path of at most
/// `max_path_length` edges on which every interior node is a definite
/// collider or sits in a triangle with its path neighbours. `x` itself is
/// not included.
pub fn possible_dsep(
    graph: &CausalGraph,
    x: &Variable,
    max_path_length: usize,
) -> BTreeSet<Variable> {
    let mut found: BTreeSet<Variable> = BTreeSet::new();
    // State is the last edge walked; a node may be reached along several.
    let mut visited: HashSet<(Variable, Variable)> = HashSet::new();
    let mut queue: VecDeque<(Variable, Variable, usize)> = VecDeque::new();

    for b in graph.adjacent(x) {
        found.insert(b.clone());
        if visited.insert((x.clone(), b.clone())) {
            queue.push_back((x.clone(), b, 1));
        }
    }

    while let Some((a, b, length)) = queue.pop_front() {
        if length >= max_path_length {
            continue;
        }
        for c in graph.adjacent(&b) {
            if c == a || &c == x {
                continue;
            }
            if graph.is_def_collider(&a, &b, &c) || graph.is_adjacent(&a, &c) {
                found.insert(c.clone());
                if visited.insert((b.clone(), c.clone())) {
                    queue.push_back((b.clone(), c, length + 1));
                }
            }
        }
    }

    found.remove(x);
    found
}

/// The edge `a - b` could be oriented `a --> b`: no arrowhead at `a`, no tail at `b`.
pub fn is_potentially_directed(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    matches!(
        (graph.endpoint(b, a), graph.endpoint(a, b)),
        (Some(at_a), Some(at_b)) if at_a != Endpoint::Arrow && at_b != Endpoint::Tail
    )
}

/// `a o-o b`.
pub fn is_circle_edge(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    graph.endpoint(a, b) == Some(Endpoint::Circle) && graph.endpoint(b, a) == Some(Endpoint::Circle)
}

/// Depth-first search for an uncovered path that starts with `prefix`
/// (at least two nodes, already valid) and ends at `target`.
///
/// Every step `u -> w` must satisfy `step_ok(u, w)`, consecutive triples
/// must be unshielded, and the finished path must satisfy `accept`.
/// Paths longer than `max_nodes` are not explored.
pub fn find_uncovered_path<S, A>(
    graph: &CausalGraph,
    prefix: &[Variable],
    target: &Variable,
    max_nodes: usize,
    step_ok: &S,
    accept: &A,
) -> Option<Vec<Variable>>
where
    S: Fn(&Variable, &Variable) -> bool,
    A: Fn(&[Variable]) -> bool,
{
    if prefix.len() < 2 {
        return None;
    }
    let mut path = prefix.to_vec();
    let mut on_path: HashSet<Variable> = path.iter().cloned().collect();
    extend_uncovered(graph, &mut path, &mut on_path, target, max_nodes, step_ok, accept)
}

fn extend_uncovered<S, A>(
    graph: &CausalGraph,
    path: &mut Vec<Variable>,
    on_path: &mut HashSet<Variable>,
    target: &Variable,
    max_nodes: usize,
    step_ok: &S,
    accept: &A,
) -> Option<Vec<Variable>>
where
    S: Fn(&Variable, &Variable) -> bool,
    A: Fn(&[Variable]) -> bool,
{
    let last = path[path.len() - 1].clone();
    if &last == target {
        return accept(path).then(|| path.clone());
    }
    if path.len() >= max_nodes {
        return None;
    }
    let prev = path[path.len() - 2].clone();
    for next in graph.adjacent(&last) {
        if on_path.contains(&next) || graph.is_adjacent(&prev, &next) || !step_ok(&last, &next) {
            continue;
        }
        path.push(next.clone());
        on_path.insert(next.clone());
        if let Some(found) = extend_uncovered(graph, path, on_path, target, max_nodes, step_ok, accept) {
            return Some(found);
        }
        on_path.remove(&next);
        path.pop();
    }
    None
}

/// An uncovered potentially directed path `prefix[0], prefix[1], ..., target`.
pub fn find_uncovered_pd_path(
    graph: &CausalGraph,
    prefix: &[Variable],
    target: &Variable,
    max_nodes: usize,
) -> Option<Vec<Variable>> {
    let step = |u: &Variable, w: &Variable| is_potentially_directed(graph, u, w);
    find_uncovered_path(graph, prefix, target, max_nodes, &step, &|_: &[Variable]| true)
}
