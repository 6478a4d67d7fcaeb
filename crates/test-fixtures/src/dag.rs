//! Ground-truth DAGs and exact d-separation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use pagoda_core::Variable;
use serde::{Deserialize, Serialize};

/// A directed acyclic graph, optionally with latent (unobserved) nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dag {
    pub variables: Vec<Variable>,
    /// `(from, to)` pairs.
    pub edges: Vec<(Variable, Variable)>,
    pub latents: BTreeSet<Variable>,
}

impl Dag {
    pub fn new(names: &[&str]) -> Self {
        Self {
            variables: names.iter().map(|n| Variable::new(*n)).collect(),
            ..Self::default()
        }
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push((Variable::new(from), Variable::new(to)));
        self
    }

    pub fn latent(mut self, name: &str) -> Self {
        self.latents.insert(Variable::new(name));
        self
    }

    /// Variables that are not latent, in declaration order.
    pub fn observed(&self) -> Vec<Variable> {
        self.variables
            .iter()
            .filter(|v| !self.latents.contains(v))
            .cloned()
            .collect()
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.variables.contains(v)
    }

    pub fn parents(&self, v: &Variable) -> Vec<Variable> {
        self.edges
            .iter()
            .filter(|(_, to)| to == v)
            .map(|(from, _)| from.clone())
            .collect()
    }

    /// `seeds` and all their ancestors.
    pub fn ancestors_of(&self, seeds: &[Variable]) -> BTreeSet<Variable> {
        let mut found: BTreeSet<Variable> = seeds.iter().cloned().collect();
        let mut queue: VecDeque<Variable> = seeds.iter().cloned().collect();
        while let Some(v) = queue.pop_front() {
            for p in self.parents(&v) {
                if found.insert(p.clone()) {
                    queue.push_back(p);
                }
            }
        }
        found
    }

    /// `x` and `y` are d-separated by `z`.
    ///
    /// Moralizes the ancestral graph of `{x, y} ∪ z`, deletes `z`, and checks
    /// that `x` cannot reach `y`.
    pub fn d_separated(&self, x: &Variable, y: &Variable, z: &[Variable]) -> bool {
        let mut seeds = vec![x.clone(), y.clone()];
        seeds.extend(z.iter().cloned());
        let ancestral = self.ancestors_of(&seeds);

        let mut moral: BTreeMap<Variable, BTreeSet<Variable>> = BTreeMap::new();
        let mut link = |a: &Variable, b: &Variable| {
            moral.entry(a.clone()).or_default().insert(b.clone());
            moral.entry(b.clone()).or_default().insert(a.clone());
        };
        for v in &ancestral {
            let parents: Vec<Variable> = self
                .parents(v)
                .into_iter()
                .filter(|p| ancestral.contains(p))
                .collect();
            for (i, p) in parents.iter().enumerate() {
                link(p, v);
                for q in &parents[i + 1..] {
                    link(p, q);
                }
            }
        }

        let blocked: BTreeSet<&Variable> = z.iter().collect();
        let mut seen: BTreeSet<Variable> = BTreeSet::new();
        let mut queue: VecDeque<Variable> = VecDeque::from([x.clone()]);
        seen.insert(x.clone());
        while let Some(v) = queue.pop_front() {
            if &v == y {
                return false;
            }
            for w in moral.get(&v).into_iter().flatten() {
                if !blocked.contains(w) && seen.insert(w.clone()) {
                    queue.push_back(w.clone());
                }
            }
        }
        true
    }
}

/// SplitMix64; deterministic across platforms.
struct SplitMix(u64);

impl SplitMix {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// A random DAG over `X0..X{n-1}`: each forward pair `i < j` gets an edge
/// `Xi -> Xj` with probability `edge_prob`.
pub fn random_dag(n: usize, edge_prob: f64, seed: u64) -> Dag {
    let mut rng = SplitMix(seed);
    let variables: Vec<Variable> = (0..n).map(|i| Variable::new(format!("X{i}"))).collect();
    let mut edges = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            if rng.next_f64() < edge_prob {
                edges.push((variables[i].clone(), variables[j].clone()));
            }
        }
    }
    Dag {
        variables,
        edges,
        latents: BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Variable {
        Variable::new(name)
    }

    #[test]
    fn collider_separation() {
        let dag = Dag::new(&["A", "B", "C"]).edge("A", "C").edge("B", "C");
        assert!(dag.d_separated(&v("A"), &v("B"), &[]));
        assert!(!dag.d_separated(&v("A"), &v("B"), &[v("C")]));
    }

    #[test]
    fn descendant_of_collider_opens_path() {
        let dag = Dag::new(&["A", "B", "C", "D"])
            .edge("A", "C")
            .edge("B", "C")
            .edge("C", "D");
        assert!(!dag.d_separated(&v("A"), &v("B"), &[v("D")]));
        assert!(dag.d_separated(&v("A"), &v("D"), &[v("C")]));
    }

    #[test]
    fn random_dag_is_deterministic_and_forward() {
        let a = random_dag(8, 0.4, 7);
        let b = random_dag(8, 0.4, 7);
        assert_eq!(a, b);
        for (from, to) in &a.edges {
            let i: usize = from.name()[1..].parse().unwrap();
            let j: usize = to.name()[1..].parse().unwrap();
            assert!(i < j);
        }
    }
}
