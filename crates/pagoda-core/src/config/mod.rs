//! Search configuration.

pub mod defaults;
pub mod search_config;

pub use search_config::{ColliderPolicy, SearchConfig, TargetKind};
