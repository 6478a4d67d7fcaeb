//! Search event sink: handler trait, payload types, and dispatcher.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::SearchEventHandler;
pub use types::*;
