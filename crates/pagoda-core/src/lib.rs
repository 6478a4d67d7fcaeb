//! # pagoda-core
//!
//! Foundation crate for the pagoda causal search workspace.
//! Defines variables, background knowledge, the independence oracle contract,
//! error enums, configuration, cancellation, and the search event sink.

pub mod cancellation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod knowledge;
pub mod oracle;
pub mod tracing_setup;
pub mod variable;

// Re-export the most commonly used types at the crate root.
pub use cancellation::{Cancellable, CancellationToken, HaltReason};
pub use config::{ColliderPolicy, SearchConfig, TargetKind};
pub use errors::{ConfigError, GraphError, KnowledgeError, OracleError, PagodaErrorCode};
pub use events::{EventDispatcher, SearchEventHandler};
pub use knowledge::{BackgroundKnowledge, Knowledge};
pub use oracle::{IndependenceOracle, IndependenceResult};
pub use variable::Variable;
