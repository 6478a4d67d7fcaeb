//! The endpoint-marked causal graph, backed by a petgraph `StableUnGraph`.

use std::collections::{BTreeMap, BTreeSet};

use pagoda_core::{GraphError, TargetKind, Variable};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};

use crate::edge::Edge;
use crate::endpoint::Endpoint;
use crate::triple::Triple;

/// Marks of one edge, relative to petgraph's stored endpoint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marks {
    at_source: Endpoint,
    at_target: Endpoint,
}

/// A graph over named variables where every edge carries a mark at each end.
///
/// At most one edge joins any pair and self-loops are rejected. Every
/// mutation replaces marks of a single edge in one step, so the graph is
/// consistent whenever a search stops.
///
/// Alongside the edges the graph records triple annotations: colliders,
/// definite noncolliders and ambiguous triples decided during orientation.
#[derive(Debug, Clone, Default)]
pub struct CausalGraph {
    graph: StableUnGraph<Variable, Marks>,
    node_index: BTreeMap<Variable, NodeIndex>,
    collider_triples: BTreeSet<Triple>,
    noncollider_triples: BTreeSet<Triple>,
    ambiguous_triples: BTreeSet<Triple>,
}

impl CausalGraph {
    /// An empty graph over `variables`. Duplicate names collapse to one node.
    pub fn new(variables: &[Variable]) -> Self {
        let mut graph = Self::default();
        for v in variables {
            graph.ensure_variable(v);
        }
        graph
    }

    /// A complete graph with `mark` at every endpoint.
    pub fn complete(variables: &[Variable], mark: Endpoint) -> Self {
        let mut graph = Self::new(variables);
        let vars = graph.variables();
        for (i, a) in vars.iter().enumerate() {
            for b in &vars[i + 1..] {
                graph.insert_edge(a, b, mark, mark);
            }
        }
        graph
    }

    // --- Nodes ---

    /// Add a variable if absent, returning its node index.
    pub fn ensure_variable(&mut self, v: &Variable) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(v) {
            return idx;
        }
        let idx = self.graph.add_node(v.clone());
        self.node_index.insert(v.clone(), idx);
        idx
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.node_index.contains_key(v)
    }

    /// All variables in name order.
    pub fn variables(&self) -> Vec<Variable> {
        self.node_index.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // --- Edge queries ---

    fn index(&self, v: &Variable) -> Option<NodeIndex> {
        self.node_index.get(v).copied()
    }

    fn find_edge(&self, a: &Variable, b: &Variable) -> Option<(EdgeIndex, NodeIndex)> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        self.graph.find_edge(ia, ib).map(|e| (e, ib))
    }

    /// Mark at the `at` end of edge `e`.
    fn mark_at(&self, e: EdgeIndex, at: NodeIndex) -> Option<Endpoint> {
        let (s, _) = self.graph.edge_endpoints(e)?;
        let marks = self.graph.edge_weight(e)?;
        Some(if s == at {
            marks.at_source
        } else {
            marks.at_target
        })
    }

    pub fn is_adjacent(&self, a: &Variable, b: &Variable) -> bool {
        self.find_edge(a, b).is_some()
    }

    /// Neighbours of `v` in name order.
    pub fn adjacent(&self, v: &Variable) -> Vec<Variable> {
        let Some(idx) = self.index(v) else {
            return Vec::new();
        };
        let mut adj: Vec<Variable> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].clone())
            .collect();
        adj.sort();
        adj.dedup();
        adj
    }

    pub fn degree(&self, v: &Variable) -> usize {
        self.index(v)
            .map(|idx| self.graph.neighbors(idx).count())
            .unwrap_or(0)
    }

    /// The mark at `b` on the edge `a - b`.
    pub fn endpoint(&self, a: &Variable, b: &Variable) -> Option<Endpoint> {
        let (e, ib) = self.find_edge(a, b)?;
        self.mark_at(e, ib)
    }

    /// The edge between `a` and `b`, listed from `a`'s side.
    pub fn edge(&self, a: &Variable, b: &Variable) -> Option<Edge> {
        Some(Edge::new(
            a.clone(),
            b.clone(),
            self.endpoint(b, a)?,
            self.endpoint(a, b)?,
        ))
    }

    /// All edges, each listed with its nodes in name order, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (s, t) = self.graph.edge_endpoints(e)?;
                let w = self.graph.edge_weight(e)?;
                Some(
                    Edge::new(
                        self.graph[s].clone(),
                        self.graph[t].clone(),
                        w.at_source,
                        w.at_target,
                    )
                    .normalized(),
                )
            })
            .collect();
        edges.sort_by(|a, b| (&a.node1, &a.node2).cmp(&(&b.node1, &b.node2)));
        edges
    }

    /// Display strings of all edges, sorted.
    pub fn edge_strings(&self) -> Vec<String> {
        self.edges().iter().map(Edge::to_string).collect()
    }

    /// Unordered adjacent pairs in name order.
    pub fn adjacent_pairs(&self) -> Vec<(Variable, Variable)> {
        self.edges()
            .into_iter()
            .map(|e| (e.node1, e.node2))
            .collect()
    }

    /// True for `a --> b`.
    pub fn is_parent_of(&self, a: &Variable, b: &Variable) -> bool {
        self.endpoint(b, a) == Some(Endpoint::Tail) && self.endpoint(a, b) == Some(Endpoint::Arrow)
    }

    pub fn parents(&self, v: &Variable) -> Vec<Variable> {
        self.adjacent(v)
            .into_iter()
            .filter(|u| self.is_parent_of(u, v))
            .collect()
    }

    pub fn children(&self, v: &Variable) -> Vec<Variable> {
        self.adjacent(v)
            .into_iter()
            .filter(|u| self.is_parent_of(v, u))
            .collect()
    }

    /// Neighbours `u` whose edge to `v` has `mark` at `v`.
    pub fn nodes_into(&self, v: &Variable, mark: Endpoint) -> Vec<Variable> {
        self.adjacent(v)
            .into_iter()
            .filter(|u| self.endpoint(u, v) == Some(mark))
            .collect()
    }

    /// `a *-> b <-* c`.
    pub fn is_def_collider(&self, a: &Variable, b: &Variable, c: &Variable) -> bool {
        self.endpoint(a, b) == Some(Endpoint::Arrow) && self.endpoint(c, b) == Some(Endpoint::Arrow)
    }

    /// A tail at `b` on either edge, or an underlined triple.
    pub fn is_def_noncollider(&self, a: &Variable, b: &Variable, c: &Variable) -> bool {
        self.endpoint(a, b) == Some(Endpoint::Tail)
            || self.endpoint(c, b) == Some(Endpoint::Tail)
            || self.is_noncollider_triple(a, b, c)
    }

    // --- Edge mutations ---

    fn insert_edge(&mut self, a: &Variable, b: &Variable, at_a: Endpoint, at_b: Endpoint) {
        let ia = self.ensure_variable(a);
        let ib = self.ensure_variable(b);
        self.graph.add_edge(
            ia,
            ib,
            Marks {
                at_source: at_a,
                at_target: at_b,
            },
        );
    }

    /// Add an edge with `at_a` at `a` and `at_b` at `b`.
    pub fn add_edge(
        &mut self,
        a: &Variable,
        b: &Variable,
        at_a: Endpoint,
        at_b: Endpoint,
    ) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop {
                name: a.to_string(),
            });
        }
        for v in [a, b] {
            if !self.contains(v) {
                return Err(GraphError::UnknownVariable {
                    name: v.to_string(),
                });
            }
        }
        if self.is_adjacent(a, b) {
            return Err(GraphError::DuplicateEdge {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        self.insert_edge(a, b, at_a, at_b);
        Ok(())
    }

    /// Add `from --> to`.
    pub fn add_directed_edge(&mut self, from: &Variable, to: &Variable) -> Result<(), GraphError> {
        self.add_edge(from, to, Endpoint::Tail, Endpoint::Arrow)
    }

    /// Add `a --- b`.
    pub fn add_undirected_edge(&mut self, a: &Variable, b: &Variable) -> Result<(), GraphError> {
        self.add_edge(a, b, Endpoint::Tail, Endpoint::Tail)
    }

    /// Add `a o-o b`.
    pub fn add_nondirected_edge(&mut self, a: &Variable, b: &Variable) -> Result<(), GraphError> {
        self.add_edge(a, b, Endpoint::Circle, Endpoint::Circle)
    }

    /// Add an edge given as a display string such as `A o-> B`.
    pub fn add_parsed_edge(&mut self, text: &str) -> Result<(), GraphError> {
        let edge = Edge::parse(text).ok_or_else(|| GraphError::UnknownVariable {
            name: text.to_string(),
        })?;
        self.add_edge(&edge.node1, &edge.node2, edge.endpoint1, edge.endpoint2)
    }

    /// Remove the edge `a - b`. Returns false if there was none.
    pub fn remove_edge(&mut self, a: &Variable, b: &Variable) -> bool {
        match self.find_edge(a, b) {
            Some((e, _)) => self.graph.remove_edge(e).is_some(),
            None => false,
        }
    }

    /// Set the mark at `b` on edge `a - b`.
    /// Returns true if the mark changed; false if unchanged or no edge exists.
    pub fn set_endpoint(&mut self, a: &Variable, b: &Variable, mark: Endpoint) -> bool {
        let Some((e, ib)) = self.find_edge(a, b) else {
            return false;
        };
        let Some((s, _)) = self.graph.edge_endpoints(e) else {
            return false;
        };
        let Some(marks) = self.graph.edge_weight_mut(e) else {
            return false;
        };
        let slot = if s == ib {
            &mut marks.at_source
        } else {
            &mut marks.at_target
        };
        if *slot == mark {
            return false;
        }
        *slot = mark;
        true
    }

    /// Replace both marks of edge `a - b` at once.
    /// Returns true if either mark changed.
    pub fn set_edge_marks(
        &mut self,
        a: &Variable,
        b: &Variable,
        at_a: Endpoint,
        at_b: Endpoint,
    ) -> bool {
        let Some((e, ib)) = self.find_edge(a, b) else {
            return false;
        };
        let Some((s, _)) = self.graph.edge_endpoints(e) else {
            return false;
        };
        let new = if s == ib {
            Marks {
                at_source: at_b,
                at_target: at_a,
            }
        } else {
            Marks {
                at_source: at_a,
                at_target: at_b,
            }
        };
        match self.graph.edge_weight_mut(e) {
            Some(marks) if *marks != new => {
                *marks = new;
                true
            }
            _ => false,
        }
    }

    /// Orient `from --> to`. Returns true if anything changed.
    pub fn set_directed(&mut self, from: &Variable, to: &Variable) -> bool {
        self.set_edge_marks(from, to, Endpoint::Tail, Endpoint::Arrow)
    }

    /// Set every endpoint of every edge to `mark`.
    pub fn reorient_all_with(&mut self, mark: Endpoint) {
        let indices: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for e in indices {
            if let Some(marks) = self.graph.edge_weight_mut(e) {
                marks.at_source = mark;
                marks.at_target = mark;
            }
        }
    }

    /// Write the collider `x *-> z <-* y`.
    ///
    /// For a CPDAG both edges become directed into `z`; for a PAG only the
    /// marks at `z` change. Returns true if any mark changed.
    pub fn orient_collider(
        &mut self,
        x: &Variable,
        z: &Variable,
        y: &Variable,
        target: TargetKind,
    ) -> bool {
        match target {
            TargetKind::Cpdag => {
                let a = self.set_directed(x, z);
                let b = self.set_directed(y, z);
                a || b
            }
            TargetKind::Pag => {
                let a = self.set_endpoint(x, z, Endpoint::Arrow);
                let b = self.set_endpoint(y, z, Endpoint::Arrow);
                a || b
            }
        }
    }

    // --- Triple annotations ---

    pub fn add_collider_triple(&mut self, x: &Variable, z: &Variable, y: &Variable) {
        let t = Triple::of(x, z, y);
        self.noncollider_triples.remove(&t);
        self.ambiguous_triples.remove(&t);
        self.collider_triples.insert(t);
    }

    /// Record a definite noncollider (an "underlined" triple).
    pub fn add_noncollider_triple(&mut self, x: &Variable, z: &Variable, y: &Variable) {
        let t = Triple::of(x, z, y);
        self.collider_triples.remove(&t);
        self.ambiguous_triples.remove(&t);
        self.noncollider_triples.insert(t);
    }

    pub fn add_ambiguous_triple(&mut self, x: &Variable, z: &Variable, y: &Variable) {
        let t = Triple::of(x, z, y);
        self.collider_triples.remove(&t);
        self.noncollider_triples.remove(&t);
        self.ambiguous_triples.insert(t);
    }

    pub fn is_collider_triple(&self, x: &Variable, z: &Variable, y: &Variable) -> bool {
        self.collider_triples.contains(&Triple::of(x, z, y))
    }

    pub fn is_noncollider_triple(&self, x: &Variable, z: &Variable, y: &Variable) -> bool {
        self.noncollider_triples.contains(&Triple::of(x, z, y))
    }

    pub fn is_ambiguous_triple(&self, x: &Variable, z: &Variable, y: &Variable) -> bool {
        self.ambiguous_triples.contains(&Triple::of(x, z, y))
    }

    pub fn collider_triples(&self) -> &BTreeSet<Triple> {
        &self.collider_triples
    }

    pub fn noncollider_triples(&self) -> &BTreeSet<Triple> {
        &self.noncollider_triples
    }

    pub fn ambiguous_triples(&self) -> &BTreeSet<Triple> {
        &self.ambiguous_triples
    }

    pub fn clear_triples(&mut self) {
        self.collider_triples.clear();
        self.noncollider_triples.clear();
        self.ambiguous_triples.clear();
    }
}

impl PartialEq for CausalGraph {
    /// Same variables, same edges with the same marks. Triple annotations
    /// are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.variables() == other.variables() && self.edges() == other.edges()
    }
}
