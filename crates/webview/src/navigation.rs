//! The asynchronous-style navigation protocol and its decision bridge.

use std::sync::Arc;

use parking_lot::Mutex;

use lantern_attribution::ViewId;

use crate::error::LoadError;
use crate::request::{LoadRequest, NavigationType};

/// Outcome of a navigation policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyDecision {
    #[default]
    Allow,
    Deny,
}

impl PolicyDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// A pending navigation the delegate is asked to rule on.
#[derive(Debug, Clone)]
pub struct NavigationAction {
    pub request: LoadRequest,
    pub navigation_type: NavigationType,
}

impl NavigationAction {
    pub fn new(request: LoadRequest, navigation_type: NavigationType) -> Self {
        Self {
            request,
            navigation_type,
        }
    }
}

/// Completion sink for a policy decision.
///
/// The bridge sits on a synchronous source API: the decision must be known
/// before `should_start_load` returns, so the sink has to be resolved
/// inline. The bridge never blocks waiting on it — a sink captured and
/// resolved after the call returns is ignored, and the decision falls back
/// to the last explicitly resolved value (initially allow). That fallback
/// is a policy choice of this layer, not a guarantee inherited from the
/// protocol.
#[derive(Clone, Default)]
pub struct DecisionSink {
    cell: Arc<Mutex<Option<PolicyDecision>>>,
}

impl DecisionSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve the decision. Later calls within the same `decide` overwrite
    /// earlier ones; calls after `decide` has returned are ignored.
    pub fn resolve(&self, decision: PolicyDecision) {
        *self.cell.lock() = Some(decision);
    }

    pub(crate) fn resolved(&self) -> Option<PolicyDecision> {
        *self.cell.lock()
    }
}

/// Phase of the current navigation cycle.
///
/// `Idle -> Started -> (Committed) -> Terminal`; an accepted top-frame
/// request moves any phase back to `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CyclePhase {
    #[default]
    Idle,
    Started,
    Committed,
    Terminal,
}

/// Receiver of the bridge's asynchronous-style navigation events.
///
/// Every method defaults to a no-op (an unimplemented `decide_policy`
/// allows), so implementors pick up only the events they care about. Per
/// navigation cycle the bridge emits at most one `did_commit` and exactly
/// one of `did_finish`/`did_fail` once the cycle has begun, in that order.
pub trait NavigationDelegate: Send + Sync {
    /// Rule on a pending navigation. Resolve `decision` before returning;
    /// an unresolved sink falls back to the last resolved decision.
    fn decide_policy(&self, view: ViewId, action: &NavigationAction, decision: DecisionSink) {
        let _ = (view, action);
        decision.resolve(PolicyDecision::Allow);
    }

    /// The engine started rendering the accepted navigation.
    fn did_commit(&self, view: ViewId) {
        let _ = view;
    }

    /// The navigation reached its terminal success state.
    fn did_finish(&self, view: ViewId) {
        let _ = view;
    }

    /// The navigation failed at the top frame.
    fn did_fail(&self, view: ViewId, error: &LoadError) {
        let _ = (view, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_sink_reports_nothing() {
        let sink = DecisionSink::new();
        assert_eq!(sink.resolved(), None);
    }

    #[test]
    fn later_resolutions_overwrite_earlier_ones() {
        let sink = DecisionSink::new();
        sink.resolve(PolicyDecision::Deny);
        sink.resolve(PolicyDecision::Allow);
        assert_eq!(sink.resolved(), Some(PolicyDecision::Allow));
    }

    #[test]
    fn clones_share_the_result_cell() {
        let sink = DecisionSink::new();
        let captured = sink.clone();
        captured.resolve(PolicyDecision::Deny);
        assert_eq!(sink.resolved(), Some(PolicyDecision::Deny));
    }
}
