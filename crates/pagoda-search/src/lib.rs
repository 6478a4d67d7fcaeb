//! # pagoda-search
//!
//! Constraint-based causal search over an [`IndependenceOracle`]:
//! adjacency (skeleton) discovery, separating-set bookkeeping, collider
//! orientation under three decision policies, and fixed-point propagation of
//! Meek rules (CPDAG targets) or FCI rules (PAG targets).
//!
//! [`IndependenceOracle`]: pagoda_core::IndependenceOracle

pub mod colliders;
pub mod context;
pub mod engine;
pub mod errors;
pub mod guards;
pub mod oracle_cache;
pub mod outcome;
pub mod possible_dsep;
pub mod repair;
pub mod rules;
pub mod sepsets;
pub mod skeleton;

pub use colliders::{ColliderOrienter, Decision, DecisionRecord, DecisionRule};
pub use context::SearchContext;
pub use engine::{search, SearchEngine};
pub use errors::SearchError;
pub use oracle_cache::CachedOracle;
pub use outcome::{SearchOutcome, SearchStats, SearchStatus, SearchWarning};
pub use sepsets::{SepsetCandidate, SepsetMap};
pub use skeleton::{SkeletonBuilder, SkeletonResult};
