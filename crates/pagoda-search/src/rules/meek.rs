//! Meek's rules R1-R4, propagated from a work list.

use std::collections::{BTreeSet, VecDeque};

use pagoda_core::constants::MAX_RULE_ITERATIONS;
use pagoda_core::{BackgroundKnowledge, Variable};
use pagoda_graph::{CausalGraph, Endpoint};
use tracing::warn;

use super::{announce, RuleReport};
use crate::context::SearchContext;
use crate::guards;

/// Orients undirected edges of a CPDAG until no rule applies.
pub struct MeekRules<'a> {
    knowledge: &'a dyn BackgroundKnowledge,
    ctx: &'a SearchContext,
    max_iterations: usize,
}

impl<'a> MeekRules<'a> {
    pub fn new(knowledge: &'a dyn BackgroundKnowledge, ctx: &'a SearchContext) -> Self {
        Self {
            knowledge,
            ctx,
            max_iterations: MAX_RULE_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run to a fixed point. Every node starts on the work list; a rewrite
    /// `a --> b` re-queues both endpoints and their neighbours.
    pub fn orient(&self, graph: &mut CausalGraph) -> RuleReport {
        let mut report = RuleReport::default();
        let mut queue: VecDeque<Variable> = graph.variables().into();
        let mut queued: BTreeSet<Variable> = queue.iter().cloned().collect();

        while let Some(v) = queue.pop_front() {
            queued.remove(&v);
            if let Err(reason) = self.ctx.check() {
                report.halted = Some(reason);
                return report;
            }
            if report.iterations >= self.max_iterations {
                warn!(iterations = report.iterations, "meek rules did not converge");
                return report;
            }
            report.iterations += 1;

            for w in graph.adjacent(&v) {
                if !is_undirected(graph, &v, &w) {
                    continue;
                }
                let oriented = [(&v, &w), (&w, &v)]
                    .into_iter()
                    .find_map(|(a, b)| self.try_orient(graph, a, b).map(|rule| (a, b, rule)));
                let Some((a, b, rule)) = oriented else {
                    continue;
                };
                graph.set_directed(a, b);
                announce(self.ctx, graph, a, b, rule);
                report.changes += 1;

                let mut touched = graph.adjacent(a);
                touched.extend(graph.adjacent(b));
                touched.push(a.clone());
                touched.push(b.clone());
                for t in touched {
                    if queued.insert(t.clone()) {
                        queue.push_back(t);
                    }
                }
            }
        }

        report.converged = true;
        report
    }

    /// The first rule that orients the undirected edge `a --- b` as
    /// `a --> b`, if the rewrite is allowed.
    fn try_orient(&self, graph: &CausalGraph, a: &Variable, b: &Variable) -> Option<&'static str> {
        let rule = if r1(graph, a, b) {
            "meek_r1"
        } else if r2(graph, a, b) {
            "meek_r2"
        } else if r3(graph, a, b) {
            "meek_r3"
        } else if r4(graph, a, b) {
            "meek_r4"
        } else {
            return None;
        };
        guards::can_orient_directed(graph, self.knowledge, a, b).then_some(rule)
    }
}

fn is_undirected(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    graph.endpoint(a, b) == Some(Endpoint::Tail) && graph.endpoint(b, a) == Some(Endpoint::Tail)
}

/// `c --> a --- b`, `c` and `b` nonadjacent. Ambiguous triples do not fire.
fn r1(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    graph
        .parents(a)
        .iter()
        .any(|c| c != b && !graph.is_adjacent(c, b) && !graph.is_ambiguous_triple(c, a, b))
}

/// `a --> c --> b` with `a --- b`.
fn r2(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    graph.children(a).iter().any(|c| graph.is_parent_of(c, b))
}

/// `c --> b <-- d`, `a --- c`, `a --- d`, `c` and `d` nonadjacent.
fn r3(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    let parents: Vec<Variable> = graph
        .parents(b)
        .into_iter()
        .filter(|c| is_undirected(graph, a, c))
        .collect();
    parents.iter().enumerate().any(|(i, c)| {
        parents[i + 1..]
            .iter()
            .any(|d| !graph.is_adjacent(c, d))
    })
}

/// `a --- d --> c --> b`, `a` adjacent to `c`, `b` and `d` nonadjacent.
fn r4(graph: &CausalGraph, a: &Variable, b: &Variable) -> bool {
    graph.parents(b).iter().any(|c| {
        c != a
            && graph.is_adjacent(a, c)
            && graph.parents(c).iter().any(|d| {
                d != a && d != b && is_undirected(graph, a, d) && !graph.is_adjacent(b, d)
            })
    })
}

#[cfg(test)]
mod tests {
    use pagoda_core::variable::variables;
    use pagoda_core::Knowledge;

    use super::*;

    fn v(name: &str) -> Variable {
        Variable::new(name)
    }

    #[test]
    fn r1_propagates_along_chain() {
        // A --> B --- C --- D
        let mut g = CausalGraph::new(&variables(["A", "B", "C", "D"]));
        g.add_directed_edge(&v("A"), &v("B")).unwrap();
        g.add_undirected_edge(&v("B"), &v("C")).unwrap();
        g.add_undirected_edge(&v("C"), &v("D")).unwrap();
        let k = Knowledge::default();
        let ctx = SearchContext::new();

        let report = MeekRules::new(&k, &ctx).orient(&mut g);
        assert!(report.converged);
        assert_eq!(report.changes, 2);
        assert_eq!(
            g.edge_strings(),
            vec!["A --> B".to_string(), "B --> C".into(), "C --> D".into()]
        );
    }

    #[test]
    fn r2_avoids_cycle() {
        // A --> C --> B, A --- B
        let mut g = CausalGraph::new(&variables(["A", "B", "C"]));
        g.add_directed_edge(&v("A"), &v("C")).unwrap();
        g.add_directed_edge(&v("C"), &v("B")).unwrap();
        g.add_undirected_edge(&v("A"), &v("B")).unwrap();
        let k = Knowledge::default();
        let ctx = SearchContext::new();

        MeekRules::new(&k, &ctx).orient(&mut g);
        assert!(g.is_parent_of(&v("A"), &v("B")));
    }

    #[test]
    fn r3_orients_into_collider() {
        // C --> B <-- D, A --- C, A --- D, A --- B
        let mut g = CausalGraph::new(&variables(["A", "B", "C", "D"]));
        g.add_directed_edge(&v("C"), &v("B")).unwrap();
        g.add_directed_edge(&v("D"), &v("B")).unwrap();
        g.add_undirected_edge(&v("A"), &v("C")).unwrap();
        g.add_undirected_edge(&v("A"), &v("D")).unwrap();
        g.add_undirected_edge(&v("A"), &v("B")).unwrap();
        g.add_collider_triple(&v("C"), &v("B"), &v("D"));
        let k = Knowledge::default();
        let ctx = SearchContext::new();

        MeekRules::new(&k, &ctx).orient(&mut g);
        assert!(g.is_parent_of(&v("A"), &v("B")));
        assert!(is_undirected(&g, &v("A"), &v("C")));
    }

    #[test]
    fn knowledge_blocks_rewrite() {
        let mut g = CausalGraph::new(&variables(["A", "B", "C"]));
        g.add_directed_edge(&v("A"), &v("B")).unwrap();
        g.add_undirected_edge(&v("B"), &v("C")).unwrap();
        let mut k = Knowledge::new();
        k.forbid("B", "C");
        let ctx = SearchContext::new();

        let report = MeekRules::new(&k, &ctx).orient(&mut g);
        assert_eq!(report.changes, 0);
        assert!(is_undirected(&g, &v("B"), &v("C")));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut g = CausalGraph::new(&variables(["A", "B", "C", "D"]));
        g.add_directed_edge(&v("A"), &v("C")).unwrap();
        g.add_directed_edge(&v("B"), &v("C")).unwrap();
        g.add_undirected_edge(&v("C"), &v("D")).unwrap();
        g.add_collider_triple(&v("A"), &v("C"), &v("B"));
        let k = Knowledge::default();
        let ctx = SearchContext::new();
        let rules = MeekRules::new(&k, &ctx);

        rules.orient(&mut g);
        let once = g.clone();
        let again = rules.orient(&mut g);
        assert_eq!(again.changes, 0);
        assert_eq!(g, once);
    }
}
