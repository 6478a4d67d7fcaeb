//! Explicit execution context: cancellation, event sink, worker pool.

use std::sync::Arc;

use pagoda_core::{CancellationToken, EventDispatcher, HaltReason};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::errors::SearchError;

/// Everything a search needs besides its inputs.
///
/// No global state is consulted: a context without a pool runs every phase
/// sequentially on the calling thread.
#[derive(Clone, Default)]
pub struct SearchContext {
    cancel: CancellationToken,
    events: Arc<EventDispatcher>,
    pool: Option<Arc<ThreadPool>>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Build a dedicated pool with `threads` workers (0 lets rayon choose).
    pub fn with_threads(self, threads: usize) -> Result<Self, SearchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pagoda-worker-{i}"))
            .build()
            .map_err(|e| SearchError::InvalidInput {
                reason: format!("cannot build worker pool: {e}"),
            })?;
        Ok(self.with_pool(Arc::new(pool)))
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn has_pool(&self) -> bool {
        self.pool.is_some()
    }

    /// Poll cancellation and the deadline.
    pub fn check(&self) -> Result<(), HaltReason> {
        self.cancel.check()
    }

    /// Map `f` over `items`, in parallel when a pool is present.
    /// Output order always matches input order.
    pub fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(|item| f(item)).collect()),
            None => items.iter().map(f).collect(),
        }
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("cancel", &self.cancel)
            .field("events", &self.events)
            .field("pool", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}
