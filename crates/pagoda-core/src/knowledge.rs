//! Background knowledge: forbidden and required directed edges plus temporal tiers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::KnowledgeError;
use crate::variable::Variable;

/// Read-only constraint interface consulted by every phase of a search.
pub trait BackgroundKnowledge: Send + Sync {
    /// True if the directed edge `from --> to` may not appear.
    fn is_forbidden(&self, from: &Variable, to: &Variable) -> bool;

    /// True if the directed edge `from --> to` must appear.
    fn is_required(&self, from: &Variable, to: &Variable) -> bool;

    /// Temporal tier of `v`, lower tiers precede higher ones.
    fn tier(&self, _v: &Variable) -> Option<usize> {
        None
    }

    /// True when `from` sits in a later tier than `to`.
    fn is_forbidden_by_tiers(&self, from: &Variable, to: &Variable) -> bool {
        matches!((self.tier(from), self.tier(to)), (Some(tf), Some(tt)) if tf > tt)
    }

    /// True when no edge between `x` and `y` is required in either direction.
    fn no_edge_required(&self, x: &Variable, y: &Variable) -> bool {
        !self.is_required(x, y) && !self.is_required(y, x)
    }

    fn is_empty(&self) -> bool {
        false
    }

    /// Reject contradictory constraint sets before a search starts.
    fn validate(&self) -> Result<(), KnowledgeError> {
        Ok(())
    }
}

/// A directed `from --> to` constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirectedPair {
    pub from: Variable,
    pub to: Variable,
}

impl DirectedPair {
    pub fn new(from: impl Into<Variable>, to: impl Into<Variable>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Concrete background knowledge.
///
/// TOML layout:
/// ```toml
/// forbidden_within_tiers = [0]
///
/// [[forbidden]]
/// from = "Y"
/// to = "X"
///
/// [[required]]
/// from = "A"
/// to = "B"
///
/// [tiers]
/// A = 0
/// B = 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Knowledge {
    pub forbidden: BTreeSet<DirectedPair>,
    pub required: BTreeSet<DirectedPair>,
    pub tiers: BTreeMap<Variable, usize>,
    pub forbidden_within_tiers: BTreeSet<usize>,
}

impl Knowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forbid(&mut self, from: impl Into<Variable>, to: impl Into<Variable>) -> &mut Self {
        self.forbidden.insert(DirectedPair::new(from, to));
        self
    }

    pub fn require(&mut self, from: impl Into<Variable>, to: impl Into<Variable>) -> &mut Self {
        self.required.insert(DirectedPair::new(from, to));
        self
    }

    pub fn set_tier(&mut self, v: impl Into<Variable>, tier: usize) -> &mut Self {
        self.tiers.insert(v.into(), tier);
        self
    }

    /// Forbid every directed edge between two variables of `tier`.
    pub fn forbid_within_tier(&mut self, tier: usize) -> &mut Self {
        self.forbidden_within_tiers.insert(tier);
        self
    }

    /// Explicitly listed forbidden edges only, ignoring tiers.
    pub fn is_explicitly_forbidden(&self, from: &Variable, to: &Variable) -> bool {
        self.forbidden.contains(&DirectedPair {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Parse and validate knowledge from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, KnowledgeError> {
        let knowledge: Knowledge = toml::from_str(toml_str).map_err(|e| KnowledgeError::Parse {
            message: e.to_string(),
        })?;
        knowledge.check_consistency()?;
        Ok(knowledge)
    }

    /// Load knowledge from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::Parse {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }

    /// Reject contradictory constraint sets.
    pub fn check_consistency(&self) -> Result<(), KnowledgeError> {
        for pair in self.forbidden.iter().chain(self.required.iter()) {
            if pair.from == pair.to {
                return Err(KnowledgeError::SelfLoop {
                    variable: pair.from.to_string(),
                });
            }
        }
        for pair in &self.required {
            if self.is_required(&pair.to, &pair.from) {
                return Err(KnowledgeError::RequiredBothWays {
                    from: pair.from.to_string(),
                    to: pair.to.to_string(),
                });
            }
            if self.is_explicitly_forbidden(&pair.from, &pair.to) {
                return Err(KnowledgeError::RequiredAndForbidden {
                    from: pair.from.to_string(),
                    to: pair.to.to_string(),
                });
            }
            if self.is_forbidden_by_tiers(&pair.from, &pair.to) {
                return Err(KnowledgeError::RequiredAgainstTiers {
                    from: pair.from.to_string(),
                    to: pair.to.to_string(),
                    from_tier: self.tiers.get(&pair.from).copied().unwrap_or_default(),
                    to_tier: self.tiers.get(&pair.to).copied().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }
}

impl BackgroundKnowledge for Knowledge {
    fn is_forbidden(&self, from: &Variable, to: &Variable) -> bool {
        self.is_explicitly_forbidden(from, to) || self.is_forbidden_by_tiers(from, to)
    }

    fn is_required(&self, from: &Variable, to: &Variable) -> bool {
        self.required.contains(&DirectedPair {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn tier(&self, v: &Variable) -> Option<usize> {
        self.tiers.get(v).copied()
    }

    /// Later-to-earlier tier edges, plus same-tier edges in tiers marked
    /// forbidden within.
    fn is_forbidden_by_tiers(&self, from: &Variable, to: &Variable) -> bool {
        match (self.tiers.get(from), self.tiers.get(to)) {
            (Some(&tf), Some(&tt)) => {
                tf > tt || (tf == tt && self.forbidden_within_tiers.contains(&tf))
            }
            _ => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.forbidden.is_empty() && self.required.is_empty() && self.tiers.is_empty()
    }

    fn validate(&self) -> Result<(), KnowledgeError> {
        self.check_consistency()
    }
}

impl<T: BackgroundKnowledge + ?Sized> BackgroundKnowledge for std::sync::Arc<T> {
    fn is_forbidden(&self, from: &Variable, to: &Variable) -> bool {
        (**self).is_forbidden(from, to)
    }

    fn is_required(&self, from: &Variable, to: &Variable) -> bool {
        (**self).is_required(from, to)
    }

    fn tier(&self, v: &Variable) -> Option<usize> {
        (**self).tier(v)
    }

    fn is_forbidden_by_tiers(&self, from: &Variable, to: &Variable) -> bool {
        (**self).is_forbidden_by_tiers(from, to)
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn validate(&self) -> Result<(), KnowledgeError> {
        (**self).validate()
    }
}
