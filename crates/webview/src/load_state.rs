//! Loading-state reconciliation between the raw engine signals and the
//! canonical observable snapshot.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::engine::RenderEngine;

/// Canonical loading flags derived from the engine's raw signals.
///
/// Once a cycle has fired its terminal event the tracker reads as not
/// loading no matter what the raw flag says — some engines keep it set
/// forever on certain pages. Back/forward availability is cached at
/// emission points rather than read live, so a reader never sees one flag
/// fresh and the other stale.
#[derive(Debug, Default)]
pub(crate) struct LoadStateTracker {
    raw_loading: bool,
    can_go_back: bool,
    can_go_forward: bool,
    terminal_latched: bool,
}

impl LoadStateTracker {
    /// Re-cache the raw engine signals. Called at every emission point.
    pub(crate) fn refresh(&mut self, engine: &dyn RenderEngine) {
        self.raw_loading = engine.is_loading();
        self.can_go_back = engine.can_go_back();
        self.can_go_forward = engine.can_go_forward();
    }

    /// A new cycle accepted a top-frame request.
    pub(crate) fn enter_started(&mut self) {
        self.terminal_latched = false;
    }

    /// The cycle fired its terminal event.
    pub(crate) fn latch_terminal(&mut self) {
        self.terminal_latched = true;
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal_latched
    }

    /// Canonical loading flag. The terminal latch wins over a stuck raw
    /// signal; the raw flag is only consulted mid-cycle.
    pub(crate) fn is_loading(&self) -> bool {
        !self.terminal_latched && self.raw_loading
    }

    pub(crate) fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub(crate) fn can_go_forward(&self) -> bool {
        self.can_go_forward
    }
}

/// Observable navigation state mirrored for external readers.
///
/// Refreshed in one step at every translator emission point, so readers
/// never observe a partially updated state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationSnapshot {
    /// Canonical URL of the current navigation.
    pub url: Option<Url>,
    /// Captured document title.
    pub title: String,
    /// Whether the current cycle is still loading.
    pub is_loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    /// Progress estimate from the progress collaborator, `0.0..=1.0`.
    pub estimated_progress: f64,
}
