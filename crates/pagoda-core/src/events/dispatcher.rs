//! EventDispatcher: synchronous fan-out to registered handlers.

use std::sync::Arc;

use super::handler::SearchEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
///
/// With no handlers registered, every `emit_*` is a loop over an empty Vec.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn SearchEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn SearchEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A handler that panics does not prevent later handlers from running.
    fn emit<F: Fn(&dyn SearchEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("search event handler panicked; continuing");
            }
        }
    }

    // ---- Phases ----
    pub fn emit_phase_started(&self, event: &PhaseStartedEvent) {
        self.emit(|h| h.on_phase_started(event));
    }

    pub fn emit_phase_finished(&self, event: &PhaseFinishedEvent) {
        self.emit(|h| h.on_phase_finished(event));
    }

    // ---- Graph changes ----
    pub fn emit_edge_removed(&self, event: &EdgeRemovedEvent) {
        self.emit(|h| h.on_edge_removed(event));
    }

    pub fn emit_triple_decided(&self, event: &TripleDecidedEvent) {
        self.emit(|h| h.on_triple_decided(event));
    }

    pub fn emit_edge_oriented(&self, event: &EdgeOrientedEvent) {
        self.emit(|h| h.on_edge_oriented(event));
    }

    // ---- Diagnostics ----
    pub fn emit_oracle_failure(&self, event: &OracleFailureEvent) {
        self.emit(|h| h.on_oracle_failure(event));
    }

    pub fn emit_warning(&self, event: &WarningEvent) {
        self.emit(|h| h.on_warning(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter {
        removed: AtomicUsize,
    }

    impl SearchEventHandler for Counter {
        fn on_edge_removed(&self, _event: &EdgeRemovedEvent) {
            self.removed.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Panicker;

    impl SearchEventHandler for Panicker {
        fn on_edge_removed(&self, _event: &EdgeRemovedEvent) {
            panic!("handler failure");
        }
    }

    fn removed_event() -> EdgeRemovedEvent {
        EdgeRemovedEvent {
            x: "A".into(),
            y: "B".into(),
            sepset: Vec::new(),
            p_value: 0.5,
            phase: SearchPhase::Skeleton,
        }
    }

    #[test]
    fn panicking_handler_does_not_block_others() {
        let counter = Arc::new(Counter::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(Panicker));
        dispatcher.register(counter.clone());

        dispatcher.emit_edge_removed(&removed_event());

        assert_eq!(dispatcher.handler_count(), 2);
        assert_eq!(counter.removed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn empty_dispatcher_is_noop() {
        EventDispatcher::new().emit_edge_removed(&removed_event());
    }
}
