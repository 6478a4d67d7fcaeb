//! Error handling for pagoda.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod graph_error;
pub mod knowledge_error;
pub mod oracle_error;

pub use config_error::ConfigError;
pub use error_code::PagodaErrorCode;
pub use graph_error::GraphError;
pub use knowledge_error::KnowledgeError;
pub use oracle_error::OracleError;
