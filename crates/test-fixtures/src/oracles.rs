//! Independence oracle stubs.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use pagoda_core::{IndependenceOracle, IndependenceResult, OracleError, Variable};
use serde::{Deserialize, Serialize};

use crate::dag::Dag;

/// Unordered pair plus sorted conditioning set.
type Key = (String, String, Vec<String>);

fn key(x: &str, y: &str, z: &[&str]) -> Key {
    let (a, b) = if x <= y { (x, y) } else { (y, x) };
    let mut z: Vec<String> = z.iter().map(|s| s.to_string()).collect();
    z.sort();
    (a.to_string(), b.to_string(), z)
}

fn key_of(x: &Variable, y: &Variable, z: &[Variable]) -> Key {
    let names: Vec<&str> = z.iter().map(Variable::name).collect();
    key(x.name(), y.name(), &names)
}

/// Exact d-separation on a ground-truth DAG. Latent nodes may not be queried.
#[derive(Debug, Clone)]
pub struct DsepOracle {
    dag: Dag,
}

impl DsepOracle {
    pub fn new(dag: Dag) -> Self {
        Self { dag }
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }
}

impl IndependenceOracle for DsepOracle {
    fn test(&self, x: &Variable, y: &Variable, z: &[Variable]) -> Result<IndependenceResult, OracleError> {
        for v in std::iter::once(x).chain(std::iter::once(y)).chain(z) {
            if !self.dag.contains(v) || self.dag.latents.contains(v) {
                return Err(OracleError::Unsupported {
                    reason: format!("'{v}' is not an observed variable"),
                });
            }
        }
        Ok(if self.dag.d_separated(x, y, z) {
            IndependenceResult::independent(1.0)
        } else {
            IndependenceResult::dependent(0.0)
        })
    }

    fn name(&self) -> &str {
        "d-separation"
    }
}

/// One independence fact: `x _||_ y | given` with a p-value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub given: Vec<String>,
    #[serde(default = "default_fact_p")]
    pub p_value: f64,
}

fn default_fact_p() -> f64 {
    0.5
}

/// Independent exactly for the listed facts; everything else is dependent
/// with p = 0.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    facts: HashMap<Key, f64>,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_facts(facts: &[Fact]) -> Self {
        let mut oracle = Self::new();
        for f in facts {
            let given: Vec<&str> = f.given.iter().map(String::as_str).collect();
            oracle.facts.insert(key(&f.x, &f.y, &given), f.p_value);
        }
        oracle
    }

    pub fn independent(mut self, x: &str, y: &str, given: &[&str], p_value: f64) -> Self {
        self.facts.insert(key(x, y, given), p_value);
        self
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl IndependenceOracle for TableOracle {
    fn test(&self, x: &Variable, y: &Variable, z: &[Variable]) -> Result<IndependenceResult, OracleError> {
        Ok(match self.facts.get(&key_of(x, y, z)) {
            Some(&p) => IndependenceResult::independent(p),
            None => IndependenceResult::dependent(0.0),
        })
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Delegates to `inner` but fails every query touching a chosen pair, or
/// every query at all.
pub struct FailingOracle<O> {
    inner: O,
    pairs: BTreeSet<(String, String)>,
    fail_all: bool,
}

impl<O: IndependenceOracle> FailingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            pairs: BTreeSet::new(),
            fail_all: false,
        }
    }

    pub fn fail_on(mut self, x: &str, y: &str) -> Self {
        let (a, b, _) = key(x, y, &[]);
        self.pairs.insert((a, b));
        self
    }

    pub fn fail_all(mut self) -> Self {
        self.fail_all = true;
        self
    }
}

impl<O: IndependenceOracle> IndependenceOracle for FailingOracle<O> {
    fn test(&self, x: &Variable, y: &Variable, z: &[Variable]) -> Result<IndependenceResult, OracleError> {
        let (a, b, _) = key_of(x, y, &[]);
        if self.fail_all || self.pairs.contains(&(a, b)) {
            return Err(OracleError::Failed {
                reason: format!("injected failure for {x}, {y}"),
            });
        }
        self.inner.test(x, y, z)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Counts calls reaching the wrapped oracle.
pub struct CountingOracle<O> {
    inner: O,
    calls: AtomicUsize,
}

impl<O: IndependenceOracle> CountingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<O: IndependenceOracle> IndependenceOracle for CountingOracle<O> {
    fn test(&self, x: &Variable, y: &Variable, z: &[Variable]) -> Result<IndependenceResult, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.test(x, y, z)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
