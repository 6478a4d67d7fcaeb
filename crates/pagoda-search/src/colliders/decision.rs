//! Collider decisions: the three policies and their records.

use std::fmt;

use pagoda_core::{ColliderPolicy, SearchConfig, Variable};
use pagoda_graph::Triple;

use crate::guards::BlockReason;
use crate::sepsets::{SepsetCandidate, SepsetMap};

/// Verdict on an unshielded triple `<x, z, y>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// `x` and `y` are separated without `z`: orient a collider.
    Independent,
    /// `z` separates `x` and `y`: definite noncollider.
    Dependent,
    /// Conditioning sets disagree.
    Ambiguous,
    /// No separating set was found.
    NoSepset,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Dependent => "dependent",
            Self::Ambiguous => "ambiguous",
            Self::NoSepset => "no_sepset",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when a decision was applied to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    /// Not applied yet, or the search stopped first.
    NotApplied,
    Oriented,
    AlreadyCollider,
    /// Recorded as a noncollider or ambiguous triple.
    Annotated,
    Blocked(BlockReason),
    /// Nothing to do (no separating set).
    Skipped,
}

/// One triple's decision plus the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    pub triple: Triple,
    pub decision: Decision,
    /// The conditioning set that won, when there is one.
    pub sepset: Option<Vec<Variable>>,
    pub p_value: Option<f64>,
    /// The oracle's auxiliary score for the winning test, if it reports one.
    pub score: Option<f64>,
    pub application: Application,
}

impl DecisionRecord {
    fn new(triple: &Triple, decision: Decision, winner: Option<&SepsetCandidate>) -> Self {
        Self {
            triple: triple.clone(),
            decision,
            sepset: winner.map(|c| c.set.clone()),
            p_value: winner.map(|c| c.p_value),
            score: winner.and_then(|c| c.score),
            application: Application::NotApplied,
        }
    }
}

/// The collider decision policy, selected once per search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionRule {
    Sepsets,
    Conservative,
    MaxP { margin: f64 },
}

impl DecisionRule {
    pub fn from_config(config: &SearchConfig) -> Self {
        match config.collider_policy {
            ColliderPolicy::Sepsets => Self::Sepsets,
            ColliderPolicy::Conservative => Self::Conservative,
            ColliderPolicy::MaxP => Self::MaxP {
                margin: config.max_p_margin,
            },
        }
    }

    /// True when the decision needs candidate enumeration rather than the
    /// recorded separating sets.
    pub fn needs_candidates(&self) -> bool {
        !matches!(self, Self::Sepsets)
    }

    /// Decide from the separating set recorded during adjacency search.
    pub fn decide_from_sepset(triple: &Triple, sepsets: &SepsetMap) -> DecisionRecord {
        let Some(entry) = sepsets.entry(&triple.x, &triple.y) else {
            return DecisionRecord::new(triple, Decision::NoSepset, None);
        };
        let decision = if entry.set.contains(&triple.z) {
            Decision::Dependent
        } else {
            Decision::Independent
        };
        DecisionRecord {
            triple: triple.clone(),
            decision,
            sepset: Some(entry.set.clone()),
            p_value: entry.p_value,
            score: entry.score,
            application: Application::NotApplied,
        }
    }

    /// Decide from enumerated candidates. Only candidates that established
    /// independence count.
    pub fn decide_from_candidates(&self, triple: &Triple, candidates: &[SepsetCandidate]) -> DecisionRecord {
        let (incl, excl): (Vec<&SepsetCandidate>, Vec<&SepsetCandidate>) = candidates
            .iter()
            .filter(|c| c.independent)
            .partition(|c| c.contains(&triple.z));

        match self {
            Self::Sepsets | Self::Conservative => match (excl.is_empty(), incl.is_empty()) {
                (true, true) => DecisionRecord::new(triple, Decision::NoSepset, None),
                (false, true) => DecisionRecord::new(triple, Decision::Independent, best(&excl)),
                (true, false) => DecisionRecord::new(triple, Decision::Dependent, best(&incl)),
                (false, false) => DecisionRecord::new(triple, Decision::Ambiguous, None),
            },
            Self::MaxP { margin } => {
                let best_excl = best(&excl);
                let best_incl = best(&incl);
                match (best_excl, best_incl) {
                    (None, None) => DecisionRecord::new(triple, Decision::NoSepset, None),
                    (Some(e), None) => DecisionRecord::new(triple, Decision::Independent, Some(e)),
                    (None, Some(i)) => DecisionRecord::new(triple, Decision::Dependent, Some(i)),
                    (Some(e), Some(i)) => {
                        // Exact ties are ambiguous even with a zero margin.
                        if e.p_value >= i.p_value + margin && e.p_value != i.p_value {
                            DecisionRecord::new(triple, Decision::Independent, Some(e))
                        } else if i.p_value >= e.p_value + margin && i.p_value != e.p_value {
                            DecisionRecord::new(triple, Decision::Dependent, Some(i))
                        } else {
                            DecisionRecord::new(triple, Decision::Ambiguous, None)
                        }
                    }
                }
            }
        }
    }
}

/// Highest p-value; ties go to the lexicographically first set.
fn best<'c>(candidates: &[&'c SepsetCandidate]) -> Option<&'c SepsetCandidate> {
    candidates.iter().copied().reduce(|best, c| {
        match c.p_value.total_cmp(&best.p_value) {
            std::cmp::Ordering::Greater => c,
            std::cmp::Ordering::Equal if c.set < best.set => c,
            _ => best,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Variable {
        Variable::new(name)
    }

    fn triple() -> Triple {
        Triple::of(&v("X"), &v("Z"), &v("Y"))
    }

    fn candidate(set: &[&str], independent: bool, p_value: f64) -> SepsetCandidate {
        SepsetCandidate {
            set: set.iter().map(|s| v(s)).collect(),
            independent,
            p_value,
            score: None,
        }
    }

    #[test]
    fn sepset_rule() {
        let mut sepsets = SepsetMap::new();
        assert_eq!(
            DecisionRule::decide_from_sepset(&triple(), &sepsets).decision,
            Decision::NoSepset
        );
        sepsets.set(&v("X"), &v("Y"), vec![v("W")], Some(0.3));
        assert_eq!(
            DecisionRule::decide_from_sepset(&triple(), &sepsets).decision,
            Decision::Independent
        );
        sepsets.set(&v("X"), &v("Y"), vec![v("Z")], Some(0.3));
        assert_eq!(
            DecisionRule::decide_from_sepset(&triple(), &sepsets).decision,
            Decision::Dependent
        );
    }

    #[test]
    fn conservative_disagreement_is_ambiguous() {
        let candidates = [candidate(&[], true, 0.4), candidate(&["Z"], true, 0.6)];
        let record = DecisionRule::Conservative.decide_from_candidates(&triple(), &candidates);
        assert_eq!(record.decision, Decision::Ambiguous);
    }

    #[test]
    fn conservative_ignores_dependent_candidates() {
        let candidates = [candidate(&[], true, 0.4), candidate(&["Z"], false, 0.01)];
        let record = DecisionRule::Conservative.decide_from_candidates(&triple(), &candidates);
        assert_eq!(record.decision, Decision::Independent);
        assert_eq!(record.sepset, Some(Vec::new()));
    }

    #[test]
    fn max_p_picks_larger_side() {
        let candidates = [
            candidate(&[], true, 0.2),
            candidate(&["W"], true, 0.7),
            candidate(&["Z"], true, 0.5),
        ];
        let rule = DecisionRule::MaxP { margin: 0.0 };
        let record = rule.decide_from_candidates(&triple(), &candidates);
        assert_eq!(record.decision, Decision::Independent);
        assert_eq!(record.sepset, Some(vec![v("W")]));
        assert_eq!(record.p_value, Some(0.7));

        let wide = DecisionRule::MaxP { margin: 0.3 };
        assert_eq!(
            wide.decide_from_candidates(&triple(), &candidates).decision,
            Decision::Ambiguous
        );
    }

    #[test]
    fn winning_score_is_kept() {
        let candidates = [
            SepsetCandidate {
                score: Some(-3.5),
                ..candidate(&["W"], true, 0.7)
            },
            SepsetCandidate {
                score: Some(1.0),
                ..candidate(&["Z"], true, 0.2)
            },
        ];
        let record = DecisionRule::MaxP { margin: 0.0 }.decide_from_candidates(&triple(), &candidates);
        assert_eq!(record.score, Some(-3.5));

        let mut sepsets = SepsetMap::new();
        sepsets.set_scored(&v("X"), &v("Y"), vec![v("W")], Some(0.7), Some(2.25));
        assert_eq!(DecisionRule::decide_from_sepset(&triple(), &sepsets).score, Some(2.25));
        assert_eq!(
            DecisionRule::Conservative.decide_from_candidates(&triple(), &[candidate(&[], true, 0.4)]).score,
            None
        );
    }

    #[test]
    fn max_p_exact_tie_is_ambiguous() {
        let candidates = [candidate(&[], true, 0.5), candidate(&["Z"], true, 0.5)];
        let rule = DecisionRule::MaxP { margin: 0.0 };
        assert_eq!(
            rule.decide_from_candidates(&triple(), &candidates).decision,
            Decision::Ambiguous
        );
    }

    #[test]
    fn max_p_tie_break_is_lexicographic() {
        let candidates = [candidate(&["W"], true, 0.5), candidate(&["V"], true, 0.5)];
        let rule = DecisionRule::MaxP { margin: 0.0 };
        let record = rule.decide_from_candidates(&triple(), &candidates);
        assert_eq!(record.sepset, Some(vec![v("V")]));
    }
}
