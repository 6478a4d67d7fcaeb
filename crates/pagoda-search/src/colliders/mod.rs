//! Collider orientation over unshielded triples.

pub mod decision;
pub mod orienter;

pub use decision::{Application, Decision, DecisionRecord, DecisionRule};
pub use orienter::{ColliderOrienter, ColliderReport};
