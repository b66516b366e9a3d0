use thiserror::Error;
use url::Url;

/// Failures the underlying rendering engine reports for a load.
///
/// Not every failure names the resource that broke: engines abandon loads
/// for internal reasons too, so the failing URL is optional.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Connectivity was lost while loading the given URL.
    #[error("no network connection while loading {0}")]
    NotConnected(Url),

    /// The load failed for an engine-reported reason.
    #[error("load of {url} failed: {reason}")]
    Failed { url: Url, reason: String },

    /// The engine abandoned a load without naming the failing resource.
    #[error("load cancelled by the engine")]
    Cancelled,
}

impl LoadError {
    /// URL of the resource that failed, when the engine reported one.
    pub fn failing_url(&self) -> Option<&Url> {
        match self {
            LoadError::NotConnected(url) => Some(url),
            LoadError::Failed { url, .. } => Some(url),
            LoadError::Cancelled => None,
        }
    }

    /// Whether this failure denotes loss of connectivity, the one class
    /// recoverable from the response cache.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, LoadError::NotConnected(_))
    }
}

/// Errors raised by the bridge itself.
#[derive(Error, Debug)]
pub enum WebViewError {
    /// A teardown hook failed while the view was being released. Teardown
    /// always completes; these are logged, never propagated.
    #[error("teardown failed: {0}")]
    Teardown(String),
}
