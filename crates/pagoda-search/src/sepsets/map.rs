//! Recorded separating sets keyed by unordered variable pairs.

use std::collections::BTreeMap;

use pagoda_core::Variable;

/// One recorded separating set.
#[derive(Debug, Clone, PartialEq)]
pub struct SepsetEntry {
    pub set: Vec<Variable>,
    /// p-value of the test that removed the edge; `None` for edges removed by
    /// background knowledge.
    pub p_value: Option<f64>,
    pub score: Option<f64>,
}

/// Separating sets found while removing edges.
///
/// Keys are unordered, so `get(x, y)` and `get(y, x)` agree. An entry is
/// written once when its edge is removed and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SepsetMap {
    entries: BTreeMap<(Variable, Variable), SepsetEntry>,
}

fn key(x: &Variable, y: &Variable) -> (Variable, Variable) {
    if x <= y {
        (x.clone(), y.clone())
    } else {
        (y.clone(), x.clone())
    }
}

impl SepsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `set` for the pair. The set is stored sorted.
    pub fn set(&mut self, x: &Variable, y: &Variable, set: Vec<Variable>, p_value: Option<f64>) {
        self.set_scored(x, y, set, p_value, None);
    }

    /// As [`SepsetMap::set`], keeping the oracle's auxiliary score.
    pub fn set_scored(
        &mut self,
        x: &Variable,
        y: &Variable,
        mut set: Vec<Variable>,
        p_value: Option<f64>,
        score: Option<f64>,
    ) {
        set.sort();
        self.entries.insert(key(x, y), SepsetEntry { set, p_value, score });
    }

    pub fn get(&self, x: &Variable, y: &Variable) -> Option<&[Variable]> {
        self.entries.get(&key(x, y)).map(|e| e.set.as_slice())
    }

    pub fn entry(&self, x: &Variable, y: &Variable) -> Option<&SepsetEntry> {
        self.entries.get(&key(x, y))
    }

    pub fn contains(&self, x: &Variable, y: &Variable) -> bool {
        self.entries.contains_key(&key(x, y))
    }

    pub fn remove(&mut self, x: &Variable, y: &Variable) -> Option<SepsetEntry> {
        self.entries.remove(&key(x, y))
    }

    /// Recorded pairs, in name order.
    pub fn pairs(&self) -> impl Iterator<Item = &(Variable, Variable)> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `z` is in the recorded separating set of `x` and `y`.
    pub fn separates_with(&self, x: &Variable, y: &Variable, z: &Variable) -> Option<bool> {
        self.get(x, y).map(|set| set.contains(z))
    }
}
