//! Process-wide mapping between view identities and live views.
//!
//! Entries are weak: a dropped view resolves to "not found" immediately,
//! but its slot stays occupied until [`ViewRegistry::release`] clears it,
//! which bounds memory rather than correctness. One mutex serializes every
//! mutation and lookup.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use crate::user_agent::{AGENT_ID_DIGITS, AGENT_ID_MARKER};
use crate::{AttributedView, ViewId};

/// Concurrency-safe id ↔ view table with a monotonic identity counter.
pub struct ViewRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    /// Creation sequence; ticks for every view, registered or bootstrap.
    sequence: u32,
    /// Whether the reserved bootstrap identity has been handed out.
    bootstrap_claimed: bool,
    entries: HashMap<ViewId, Weak<dyn AttributedView>>,
}

impl RegistryState {
    fn tick(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }
}

impl ViewRegistry {
    /// Create an empty registry. Production code normally goes through
    /// [`ViewRegistry::shared`]; fresh instances exist for tests.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// The process-wide registry instance.
    pub fn shared() -> Arc<ViewRegistry> {
        static SHARED: OnceLock<Arc<ViewRegistry>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(ViewRegistry::new())).clone()
    }

    /// Allocate the next identity and store a weak entry for `view`.
    ///
    /// Identities come from a monotonic counter. The very first assignment
    /// in this registry's lifetime returns the reserved bootstrap identity
    /// regardless of the counter, so bootstrap lookups resolve before any
    /// identity template exists.
    pub fn assign(&self, view: Weak<dyn AttributedView>) -> ViewId {
        let mut state = self.state.lock();
        let sequence = state.tick();
        let id = if state.bootstrap_claimed {
            ViewId::from_sequence(sequence)
        } else {
            state.bootstrap_claimed = true;
            ViewId::BOOTSTRAP
        };
        state.entries.insert(id, view);
        log::debug!("assigned view identity {}", id);
        id
    }

    /// Bind `view` to the reserved bootstrap identity, ticking the
    /// creation sequence. Returns the sequence value so the caller can
    /// detect views racing the first request. Rebinding overwrites the
    /// previous bootstrap entry.
    pub(crate) fn bind_bootstrap(&self, view: Weak<dyn AttributedView>) -> u32 {
        let mut state = self.state.lock();
        let sequence = state.tick();
        state.bootstrap_claimed = true;
        state.entries.insert(ViewId::BOOTSTRAP, view);
        sequence
    }

    /// Resolve an identity to a live view. Dead or unknown entries report
    /// not-found.
    pub fn lookup_by_id(&self, id: ViewId) -> Option<Arc<dyn AttributedView>> {
        self.state.lock().entries.get(&id).and_then(Weak::upgrade)
    }

    /// Resolve a view from the identity token embedded in an outbound
    /// carrier string.
    ///
    /// The carrier is scanned for the fixed marker followed by a six-digit
    /// decimal identity field. A carrier without the marker denotes the
    /// bootstrap view, which issues requests under the platform default.
    /// A marker followed by anything but six digits never resolves.
    pub fn lookup_by_token(&self, carrier: &str) -> Option<Arc<dyn AttributedView>> {
        let Some(marker_at) = carrier.find(AGENT_ID_MARKER) else {
            return self.lookup_by_id(ViewId::BOOTSTRAP);
        };
        let field = carrier
            .get(marker_at + AGENT_ID_MARKER.len()..)
            .and_then(|rest| rest.get(..AGENT_ID_DIGITS))?;
        if !field.bytes().all(|b| b.is_ascii_digit()) {
            log::warn!("malformed identity token in carrier: {:?}", field);
            return None;
        }
        let id = field.parse::<u32>().ok()?;
        self.lookup_by_id(ViewId::from_sequence(id))
    }

    /// Remove the entry for `id`. Idempotent.
    pub fn release(&self, id: ViewId) {
        if self.state.lock().entries.remove(&id).is_some() {
            log::debug!("released view identity {}", id);
        }
    }

    /// Number of occupied slots, live or stale.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether no slots are occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}
