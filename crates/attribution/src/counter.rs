//! Per-view request attribution counting.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::registry::ViewRegistry;
use crate::ViewId;

/// Errors that can occur while attributing requests.
#[derive(Error, Debug, PartialEq)]
pub enum AttributionError {
    /// The identity does not resolve to a live view.
    #[error("view not found: {0}")]
    NotFound(ViewId),

    /// The carrier token does not resolve to a live view.
    #[error("carrier does not resolve to a live view")]
    UnresolvedCarrier,
}

/// Result type for attribution operations.
pub type AttributionResult<T> = Result<T, AttributionError>;

/// Observer notified every time a request is attributed to a view, e.g. a
/// tracking-protection aggregator.
pub trait AttributionObserver: Send + Sync {
    /// `count` is the view's running total after the increment.
    fn on_attributed_request(&self, view: ViewId, count: u64);
}

/// Count of requests attributed to one view.
///
/// Owned by the view itself and guarded by its own lock; the registry only
/// ever reaches it through a weak handle.
#[derive(Debug, Default)]
pub struct AttributionCounter {
    count: Mutex<u64>,
}

impl AttributionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current running total.
    pub fn current(&self) -> u64 {
        *self.count.lock()
    }

    /// Increment the total, returning the new value.
    pub fn increment(&self) -> u64 {
        let mut count = self.count.lock();
        *count += 1;
        *count
    }

    /// Reset to zero at the start of a new top-level navigation.
    pub fn reset(&self) {
        *self.count.lock() = 0;
    }
}

/// Resolves identities and records attributed requests, fanning the change
/// notification out to registered observers.
pub struct RequestAttribution {
    registry: Arc<ViewRegistry>,
    observers: RwLock<Vec<Arc<dyn AttributionObserver>>>,
}

impl RequestAttribution {
    pub fn new(registry: Arc<ViewRegistry>) -> Self {
        Self {
            registry,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer for attribution notifications.
    pub fn observe(&self, observer: Arc<dyn AttributionObserver>) {
        self.observers.write().push(observer);
    }

    /// Attribute one request to `view`, returning the new running count.
    pub fn record(&self, view: ViewId) -> AttributionResult<u64> {
        let resolved = self
            .registry
            .lookup_by_id(view)
            .ok_or(AttributionError::NotFound(view))?;
        let count = resolved.attribution().increment();
        self.notify(view, count);
        Ok(count)
    }

    /// Attribute one request via the carrier token it was sent with.
    pub fn record_token(&self, carrier: &str) -> AttributionResult<(ViewId, u64)> {
        let resolved = self
            .registry
            .lookup_by_token(carrier)
            .ok_or(AttributionError::UnresolvedCarrier)?;
        let view = resolved.identity();
        let count = resolved.attribution().increment();
        self.notify(view, count);
        Ok((view, count))
    }

    fn notify(&self, view: ViewId, count: u64) {
        for observer in self.observers.read().iter() {
            observer.on_attributed_request(view, count);
        }
    }
}
