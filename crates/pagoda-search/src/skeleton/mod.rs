//! Depth-bounded adjacency search.

pub mod builder;

pub use builder::{SkeletonBuilder, SkeletonResult};
