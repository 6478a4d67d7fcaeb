use std::fmt;

use serde::{Deserialize, Serialize};

/// A named variable in the search.
///
/// Variables compare and order by name. All deterministic iteration in the
/// engine (edges, triples, conditioning subsets) relies on this ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Variable {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a list of variables from names.
pub fn variables<I, S>(names: I) -> Vec<Variable>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(|n| Variable::new(n)).collect()
}

/// Render a conditioning set as `{a, b, c}`.
pub fn format_set(set: &[Variable]) -> String {
    let names: Vec<&str> = set.iter().map(Variable::name).collect();
    format!("{{{}}}", names.join(", "))
}
