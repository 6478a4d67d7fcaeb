//! FCI orientation rules for PAG targets.
//!
//! R1-R4 run to a fixed point. With the complete rule set, R5 runs once and
//! then R6-R7 and R8-R10 each run to their own fixed point; the whole
//! sequence repeats until a round changes nothing.

use pagoda_core::constants::MAX_RULE_ITERATIONS;
use pagoda_core::{BackgroundKnowledge, TargetKind, Variable};
use pagoda_graph::paths::{find_uncovered_path, find_uncovered_pd_path, is_circle_edge, is_potentially_directed};
use pagoda_graph::{CausalGraph, Endpoint};
use tracing::{debug, warn};

use super::discriminating::{candidate_ends, find_discriminating_path, DiscriminatingPath, Verdict};
use super::{announce, RuleReport};
use crate::context::SearchContext;
use crate::guards;
use crate::oracle_cache::CachedOracle;
use crate::sepsets::SepsetMap;

pub struct FciRules<'a> {
    knowledge: &'a dyn BackgroundKnowledge,
    sepsets: &'a SepsetMap,
    oracle: Option<&'a CachedOracle<'a>>,
    ctx: &'a SearchContext,
    max_path_length: usize,
    complete: bool,
    max_iterations: usize,
}

impl<'a> FciRules<'a> {
    pub fn new(knowledge: &'a dyn BackgroundKnowledge, sepsets: &'a SepsetMap, ctx: &'a SearchContext) -> Self {
        Self {
            knowledge,
            sepsets,
            oracle: None,
            ctx,
            max_path_length: pagoda_core::constants::MAX_DISCRIMINATING_PATH_CAP,
            complete: true,
            max_iterations: MAX_RULE_ITERATIONS,
        }
    }

    /// Oracle consulted by R4 when a discriminating path has no recorded
    /// separating set.
    pub fn with_oracle(mut self, oracle: &'a CachedOracle<'a>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_complete_rule_set(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn orient(&self, graph: &mut CausalGraph) -> RuleReport {
        let mut report = RuleReport::default();
        loop {
            let before = report.changes;
            if !self.fixpoint(graph, &mut report, &[Self::rule_r1, Self::rule_r2, Self::rule_r3, Self::rule_r4]) {
                return report;
            }
            if self.complete {
                report.changes += self.rule_r5(graph);
                if !self.fixpoint(graph, &mut report, &[Self::rule_r6, Self::rule_r7]) {
                    return report;
                }
                if !self.fixpoint(graph, &mut report, &[Self::rule_r8, Self::rule_r9, Self::rule_r10]) {
                    return report;
                }
            }
            if report.changes == before {
                break;
            }
        }
        report.converged = true;
        report
    }

    /// Apply `rules` in order until a sweep changes nothing. Returns false if
    /// the search must stop (halted or out of iterations).
    fn fixpoint(
        &self,
        graph: &mut CausalGraph,
        report: &mut RuleReport,
        rules: &[fn(&Self, &mut CausalGraph) -> usize],
    ) -> bool {
        loop {
            if let Err(reason) = self.ctx.check() {
                report.halted = Some(reason);
                return false;
            }
            if report.iterations >= self.max_iterations {
                warn!(iterations = report.iterations, "fci rules did not converge");
                return false;
            }
            report.iterations += 1;
            let changed: usize = rules.iter().map(|rule| rule(self, graph)).sum();
            if changed == 0 {
                return true;
            }
            report.changes += changed;
        }
    }

    fn arrowhead_allowed(&self, graph: &CausalGraph, from: &Variable, to: &Variable) -> bool {
        guards::is_arrowhead_allowed(graph, self.knowledge, TargetKind::Pag, from, to)
    }

    /// Put an arrowhead at `to` on `from *-* to`, if allowed.
    fn set_arrow(&self, graph: &mut CausalGraph, from: &Variable, to: &Variable, rule: &'static str) -> bool {
        if !self.arrowhead_allowed(graph, from, to) || !graph.set_endpoint(from, to, Endpoint::Arrow) {
            return false;
        }
        announce(self.ctx, graph, from, to, rule);
        true
    }

    /// Put a tail at `to` on `from *-* to`.
    fn set_tail(&self, graph: &mut CausalGraph, from: &Variable, to: &Variable, rule: &'static str) -> bool {
        if !graph.set_endpoint(from, to, Endpoint::Tail) {
            return false;
        }
        announce(self.ctx, graph, from, to, rule);
        true
    }

    /// R1: `a *-> b o-* c`, `a` and `c` nonadjacent, gives `b --> c`.
    fn rule_r1(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for b in graph.variables() {
            for a in graph.nodes_into(&b, Endpoint::Arrow) {
                for c in graph.nodes_into(&b, Endpoint::Circle) {
                    if c == a || graph.is_adjacent(&a, &c) || !self.arrowhead_allowed(graph, &b, &c) {
                        continue;
                    }
                    if graph.set_edge_marks(&b, &c, Endpoint::Tail, Endpoint::Arrow) {
                        announce(self.ctx, graph, &b, &c, "fci_r1");
                        changes += 1;
                    }
                }
            }
        }
        changes
    }

    /// R2: `a --> b *-> c` or `a *-> b --> c`, with `a *-o c`, gives `a *-> c`.
    fn rule_r2(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for a in graph.variables() {
            for c in graph.adjacent(&a) {
                if graph.endpoint(&a, &c) != Some(Endpoint::Circle) {
                    continue;
                }
                let through = graph.adjacent(&a).into_iter().any(|b| {
                    b != c
                        && graph.is_adjacent(&b, &c)
                        && graph.endpoint(&a, &b) == Some(Endpoint::Arrow)
                        && graph.endpoint(&b, &c) == Some(Endpoint::Arrow)
                        && (graph.endpoint(&b, &a) == Some(Endpoint::Tail)
                            || graph.endpoint(&c, &b) == Some(Endpoint::Tail))
                });
                if through && self.set_arrow(graph, &a, &c, "fci_r2") {
                    changes += 1;
                }
            }
        }
        changes
    }

    /// R3: `a *-> b <-* c`, `a *-o d o-* c`, `a` and `c` nonadjacent,
    /// `d *-o b`, gives `d *-> b`.
    fn rule_r3(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for b in graph.variables() {
            let into_b = graph.nodes_into(&b, Endpoint::Arrow);
            for d in graph.nodes_into(&b, Endpoint::Circle) {
                let fires = into_b.iter().enumerate().any(|(i, a)| {
                    into_b[i + 1..].iter().any(|c| {
                        !graph.is_adjacent(a, c)
                            && graph.endpoint(a, &d) == Some(Endpoint::Circle)
                            && graph.endpoint(c, &d) == Some(Endpoint::Circle)
                    })
                });
                if fires && self.set_arrow(graph, &d, &b, "fci_r3") {
                    changes += 1;
                }
            }
        }
        changes
    }

    /// R4: for a discriminating path `<d, ..., a, b, c>`, `b --> c` when `b`
    /// separates `d` and `c`, otherwise `a <-> b <-> c`.
    fn rule_r4(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for b in graph.variables() {
            for (a, c) in candidate_ends(graph, &b) {
                // A previous rewrite at `b` may have closed this candidate.
                if graph.endpoint(&c, &b) != Some(Endpoint::Circle) {
                    continue;
                }
                let found = find_discriminating_path(graph, &a, &b, &c, self.max_path_length, |path| {
                    self.discriminate(path)
                });
                let Some((path, verdict)) = found else {
                    continue;
                };
                debug!(d = %path.d, b = %b, c = %c, ?verdict, "discriminating path");
                match verdict {
                    Verdict::Noncollider => {
                        if self.set_tail(graph, &c, &b, "fci_r4") {
                            changes += 1;
                        }
                    }
                    Verdict::Collider => {
                        if self.arrowhead_allowed(graph, &a, &b) && self.arrowhead_allowed(graph, &c, &b) {
                            let first = self.set_arrow(graph, &a, &b, "fci_r4");
                            let second = self.set_arrow(graph, &c, &b, "fci_r4");
                            changes += usize::from(first) + usize::from(second);
                        }
                    }
                }
            }
        }
        changes
    }

    /// Recorded separating set first; otherwise ask the oracle with the path
    /// interior, with and without `b`.
    fn discriminate(&self, path: &DiscriminatingPath) -> Option<Verdict> {
        if let Some(set) = self.sepsets.get(&path.d, &path.c) {
            return Some(if set.contains(&path.b) {
                Verdict::Noncollider
            } else {
                Verdict::Collider
            });
        }
        let oracle = self.oracle?;
        let mut with_b = path.interior.clone();
        with_b.push(path.b.clone());
        if oracle.test(&path.d, &path.c, &with_b).independent {
            Some(Verdict::Noncollider)
        } else if oracle.test(&path.d, &path.c, &path.interior).independent {
            Some(Verdict::Collider)
        } else {
            None
        }
    }

    /// R5: an uncovered circle path `a o-o c o-o ... o-o d o-o b` closing an
    /// uncovered circle cycle with `a o-o b` turns the cycle into tails.
    fn rule_r5(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        let max_nodes = graph.node_count();
        for (a, b) in graph.adjacent_pairs() {
            if !is_circle_edge(graph, &a, &b) {
                continue;
            }
            let found = graph.adjacent(&a).into_iter().find_map(|c| {
                if c == b || !is_circle_edge(graph, &a, &c) || graph.is_adjacent(&c, &b) {
                    return None;
                }
                let step = |u: &Variable, w: &Variable| is_circle_edge(graph, u, w);
                let accept = |path: &[Variable]| {
                    path.len() >= 4 && !graph.is_adjacent(&path[path.len() - 2], &a)
                };
                find_uncovered_path(graph, &[a.clone(), c], &b, max_nodes, &step, &accept)
            });
            let Some(path) = found else {
                continue;
            };
            if graph.set_edge_marks(&a, &b, Endpoint::Tail, Endpoint::Tail) {
                announce(self.ctx, graph, &a, &b, "fci_r5");
                changes += 1;
            }
            for pair in path.windows(2) {
                if graph.set_edge_marks(&pair[0], &pair[1], Endpoint::Tail, Endpoint::Tail) {
                    announce(self.ctx, graph, &pair[0], &pair[1], "fci_r5");
                    changes += 1;
                }
            }
        }
        changes
    }

    /// R6: `a --- b o-* c` gives `b -* c`.
    fn rule_r6(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for b in graph.variables() {
            let has_undirected = graph.nodes_into(&b, Endpoint::Tail).iter().any(|a| {
                graph.endpoint(&b, a) == Some(Endpoint::Tail)
            });
            if !has_undirected {
                continue;
            }
            for c in graph.nodes_into(&b, Endpoint::Circle) {
                if self.set_tail(graph, &c, &b, "fci_r6") {
                    changes += 1;
                }
            }
        }
        changes
    }

    /// R7: `a --o b o-* c`, `a` and `c` nonadjacent, gives `b -* c`.
    fn rule_r7(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for b in graph.variables() {
            let tails_from: Vec<Variable> = graph
                .nodes_into(&b, Endpoint::Circle)
                .into_iter()
                .filter(|a| graph.endpoint(&b, a) == Some(Endpoint::Tail))
                .collect();
            if tails_from.is_empty() {
                continue;
            }
            for c in graph.nodes_into(&b, Endpoint::Circle) {
                let fires = tails_from.iter().any(|a| a != &c && !graph.is_adjacent(a, &c));
                if fires && self.set_tail(graph, &c, &b, "fci_r7") {
                    changes += 1;
                }
            }
        }
        changes
    }

    /// Every `a o-> c` in the graph.
    fn partially_oriented(graph: &CausalGraph) -> Vec<(Variable, Variable)> {
        let mut edges = Vec::new();
        for c in graph.variables() {
            for a in graph.nodes_into(&c, Endpoint::Arrow) {
                if graph.endpoint(&c, &a) == Some(Endpoint::Circle) {
                    edges.push((a, c.clone()));
                }
            }
        }
        edges
    }

    /// R8: `a --> b --> c` or `a -o b --> c`, with `a o-> c`, gives `a --> c`.
    fn rule_r8(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        for (a, c) in Self::partially_oriented(graph) {
            let fires = graph.nodes_into(&c, Endpoint::Arrow).iter().any(|b| {
                b != &a
                    && graph.is_parent_of(b, &c)
                    && graph.endpoint(b, &a) == Some(Endpoint::Tail)
                    && matches!(graph.endpoint(&a, b), Some(Endpoint::Arrow | Endpoint::Circle))
            });
            if fires && self.set_tail(graph, &c, &a, "fci_r8") {
                changes += 1;
            }
        }
        changes
    }

    /// R9: `a o-> c` with an uncovered potentially directed path
    /// `a, m, ..., c` where `m` and `c` are nonadjacent gives `a --> c`.
    fn rule_r9(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        let max_nodes = graph.node_count();
        for (a, c) in Self::partially_oriented(graph) {
            let fires = graph.adjacent(&a).into_iter().any(|m| {
                m != c
                    && !graph.is_adjacent(&m, &c)
                    && is_potentially_directed(graph, &a, &m)
                    && find_uncovered_pd_path(graph, &[a.clone(), m], &c, max_nodes).is_some()
            });
            if fires && self.set_tail(graph, &c, &a, "fci_r9") {
                changes += 1;
            }
        }
        changes
    }

    /// R10: `a o-> c`, `b --> c <-- d`, uncovered potentially directed paths
    /// `a, m, ..., b` and `a, w, ..., d` with `m` and `w` distinct and
    /// nonadjacent, gives `a --> c`.
    fn rule_r10(&self, graph: &mut CausalGraph) -> usize {
        let mut changes = 0;
        let max_nodes = graph.node_count();
        for (a, c) in Self::partially_oriented(graph) {
            let parents: Vec<Variable> = graph.parents(&c).into_iter().filter(|p| p != &a).collect();
            if parents.len() < 2 {
                continue;
            }
            let starts: Vec<Variable> = graph
                .adjacent(&a)
                .into_iter()
                .filter(|m| m != &c && is_potentially_directed(graph, &a, m))
                .collect();
            let reaches = |m: &Variable, target: &Variable| {
                find_uncovered_pd_path(graph, &[a.clone(), m.clone()], target, max_nodes).is_some()
            };

            let mut fires = false;
            'search: for (i, b) in parents.iter().enumerate() {
                for d in &parents[i + 1..] {
                    for m in &starts {
                        for w in &starts {
                            if m == w || graph.is_adjacent(m, w) {
                                continue;
                            }
                            if reaches(m, b) && reaches(w, d) {
                                fires = true;
                                break 'search;
                            }
                        }
                    }
                }
            }
            if fires && self.set_tail(graph, &c, &a, "fci_r10") {
                changes += 1;
            }
        }
        changes
    }
}
