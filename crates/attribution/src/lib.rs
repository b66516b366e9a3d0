//! Lantern View Attribution
//!
//! This crate assigns every rendering view a stable numeric identity,
//! embeds that identity in the view's outbound network carrier string, and
//! counts the requests attributed back to each view. Downstream
//! tracking-protection accounting resolves a carrier token to the issuing
//! view through the process-wide [`ViewRegistry`] and records hits via
//! [`RequestAttribution`].
//!
//! The registry never owns a view: entries are weak handles reached through
//! the [`AttributedView`] capability trait, so destroying a view never has
//! to coordinate with this layer.

pub mod counter;
pub mod registry;
pub mod user_agent;

pub use counter::{
    AttributionCounter, AttributionError, AttributionObserver, AttributionResult,
    RequestAttribution,
};
pub use registry::ViewRegistry;
pub use user_agent::{DeviceClass, IssuedIdentity, UserAgentIssuer, AGENT_ID_MARKER};

use std::fmt;

/// Identity of one live rendering view.
///
/// Positive, unique per live view, and stable for the view's lifetime.
/// Identity `1` is reserved for the bootstrap view created before any
/// identity template exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl ViewId {
    /// Reserved identity of the first view in the process.
    pub const BOOTSTRAP: ViewId = ViewId(1);

    pub(crate) fn from_sequence(sequence: u32) -> Self {
        ViewId(sequence)
    }

    /// Raw numeric value.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability surface the attribution layer needs from a view.
///
/// Views implement this so the registry can hand them out without owning
/// them and so [`RequestAttribution`] can reach their counters.
pub trait AttributedView: Send + Sync {
    /// The identity assigned when the view was created.
    fn identity(&self) -> ViewId;

    /// The view's request attribution counter.
    fn attribution(&self) -> &AttributionCounter;
}
