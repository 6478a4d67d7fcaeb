//! Edge values returned by graph queries.

use std::fmt;

use pagoda_core::Variable;
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;

/// An edge between `node1` and `node2`; `endpoint1` is the mark at `node1`,
/// `endpoint2` the mark at `node2`.
///
/// This is a snapshot, not a handle: mutating the graph does not update it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub node1: Variable,
    pub node2: Variable,
    pub endpoint1: Endpoint,
    pub endpoint2: Endpoint,
}

impl Edge {
    pub fn new(node1: Variable, node2: Variable, endpoint1: Endpoint, endpoint2: Endpoint) -> Self {
        Self {
            node1,
            node2,
            endpoint1,
            endpoint2,
        }
    }

    /// `from --> to`.
    pub fn directed(from: Variable, to: Variable) -> Self {
        Self::new(from, to, Endpoint::Tail, Endpoint::Arrow)
    }

    /// Same edge with the nodes listed in name order.
    pub fn normalized(self) -> Self {
        if self.node1 <= self.node2 {
            self
        } else {
            Self::new(self.node2, self.node1, self.endpoint2, self.endpoint1)
        }
    }

    /// Mark at `v`, if `v` is on this edge.
    pub fn endpoint_at(&self, v: &Variable) -> Option<Endpoint> {
        if &self.node1 == v {
            Some(self.endpoint1)
        } else if &self.node2 == v {
            Some(self.endpoint2)
        } else {
            None
        }
    }

    pub fn other(&self, v: &Variable) -> Option<&Variable> {
        if &self.node1 == v {
            Some(&self.node2)
        } else if &self.node2 == v {
            Some(&self.node1)
        } else {
            None
        }
    }

    pub fn is_directed(&self) -> bool {
        matches!(
            (self.endpoint1, self.endpoint2),
            (Endpoint::Tail, Endpoint::Arrow) | (Endpoint::Arrow, Endpoint::Tail)
        )
    }

    pub fn is_bidirected(&self) -> bool {
        self.endpoint1 == Endpoint::Arrow && self.endpoint2 == Endpoint::Arrow
    }

    /// Tail at both ends.
    pub fn is_undirected(&self) -> bool {
        self.endpoint1 == Endpoint::Tail && self.endpoint2 == Endpoint::Tail
    }

    /// Circle at both ends.
    pub fn is_nondirected(&self) -> bool {
        self.endpoint1 == Endpoint::Circle && self.endpoint2 == Endpoint::Circle
    }

    /// `o->` in either direction.
    pub fn is_partially_oriented(&self) -> bool {
        matches!(
            (self.endpoint1, self.endpoint2),
            (Endpoint::Circle, Endpoint::Arrow) | (Endpoint::Arrow, Endpoint::Circle)
        )
    }

    /// True for `other --> v`.
    pub fn points_towards(&self, v: &Variable) -> bool {
        self.is_directed() && self.endpoint_at(v) == Some(Endpoint::Arrow)
    }

    /// Parse the display form, e.g. `A o-> B`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let n1 = parts.next()?;
        let glyphs: Vec<char> = parts.next()?.chars().collect();
        let n2 = parts.next()?;
        if parts.next().is_some() || glyphs.len() != 3 || glyphs[1] != '-' {
            return None;
        }
        Some(Self::new(
            Variable::new(n1),
            Variable::new(n2),
            Endpoint::from_left_glyph(glyphs[0])?,
            Endpoint::from_right_glyph(glyphs[2])?,
        ))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.node1,
            self.endpoint1.left_glyph(),
            self.endpoint2.right_glyph(),
            self.node2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(e1: Endpoint, e2: Endpoint) -> Edge {
        Edge::new("A".into(), "B".into(), e1, e2)
    }

    #[test]
    fn display_forms() {
        use Endpoint::*;
        assert_eq!(edge(Tail, Arrow).to_string(), "A --> B");
        assert_eq!(edge(Arrow, Arrow).to_string(), "A <-> B");
        assert_eq!(edge(Tail, Tail).to_string(), "A --- B");
        assert_eq!(edge(Circle, Circle).to_string(), "A o-o B");
        assert_eq!(edge(Circle, Arrow).to_string(), "A o-> B");
        assert_eq!(edge(Tail, Circle).to_string(), "A --o B");
    }

    #[test]
    fn parse_inverts_display() {
        let e = edge(Endpoint::Circle, Endpoint::Arrow);
        assert_eq!(Edge::parse(&e.to_string()), Some(e));
        assert_eq!(Edge::parse("A => B"), None);
    }

    #[test]
    fn normalized_swaps_marks() {
        let e = Edge::directed("B".into(), "A".into()).normalized();
        assert_eq!(e.to_string(), "A <-- B");
        assert!(e.points_towards(&"A".into()));
    }
}
