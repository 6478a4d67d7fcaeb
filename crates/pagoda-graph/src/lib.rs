//! # pagoda-graph
//!
//! Endpoint-marked causal graphs: one edge per variable pair, each end of an
//! edge carrying a tail, arrowhead, or circle. Covers both CPDAGs (tails and
//! arrows only) and PAGs (circles allowed), plus the path queries and
//! legality predicates the search engine needs.

pub mod edge;
pub mod endpoint;
pub mod graph;
pub mod legality;
pub mod paths;
pub mod triple;

pub use edge::Edge;
pub use endpoint::Endpoint;
pub use graph::CausalGraph;
pub use legality::{check_legality, is_legal, LegalityIssue};
pub use triple::{unshielded_triples, Triple};
