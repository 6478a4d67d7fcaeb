//! Separating-set registry and candidate enumeration.

pub mod candidates;
pub mod map;
pub mod subsets;

pub use candidates::{enumerate_candidates, SepsetCandidate};
pub use map::SepsetMap;
pub use subsets::Subsets;
