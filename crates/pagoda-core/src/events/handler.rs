//! Search event handler trait.

use super::types::*;

/// Receives progress and diagnostic events from a running search.
///
/// Every method has a no-op default, so handlers implement only what they
/// need. Handlers are called synchronously from the thread that produced
/// the event and must be cheap.
pub trait SearchEventHandler: Send + Sync {
    fn on_phase_started(&self, _event: &PhaseStartedEvent) {}
    fn on_phase_finished(&self, _event: &PhaseFinishedEvent) {}
    fn on_edge_removed(&self, _event: &EdgeRemovedEvent) {}
    fn on_triple_decided(&self, _event: &TripleDecidedEvent) {}
    fn on_edge_oriented(&self, _event: &EdgeOrientedEvent) {}
    fn on_oracle_failure(&self, _event: &OracleFailureEvent) {}
    fn on_warning(&self, _event: &WarningEvent) {}
}
