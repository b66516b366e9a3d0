//! Capability traits for the bridge's external collaborators.
//!
//! Collaborators are injected as trait objects rather than subclassed, so
//! the bridge can be exercised against mock engines in tests and against
//! the real rendering engine in production.

use url::Url;

use crate::error::LoadError;
use crate::navigation::NavigationAction;
use crate::request::LoadRequest;

/// Surface of the underlying synchronous rendering engine.
pub trait RenderEngine: Send + Sync {
    /// Raw loading flag. Some engines never clear it for certain pages;
    /// the bridge reconciles it through the load-state tracker.
    fn is_loading(&self) -> bool;

    /// Raw back-history availability.
    fn can_go_back(&self) -> bool;

    /// Raw forward-history availability.
    fn can_go_forward(&self) -> bool;

    /// Evaluate a script inline on the engine's execution context and
    /// return its string result.
    fn evaluate_script(&self, script: &str) -> Option<String>;

    /// Begin loading `request`.
    fn load_request(&self, request: &LoadRequest);

    /// Replace the current document with `html`, served as `base_url`.
    fn load_html(&self, html: &str, base_url: &Url);

    fn stop_loading(&self);
    fn reload(&self);
    fn go_back(&self);
    fn go_forward(&self);
}

/// Injected policy/progress collaborator. Gets a veto before the
/// navigation delegate sees a request and receives the raw lifecycle
/// callbacks for progress estimation.
pub trait ProgressCoordinator: Send + Sync {
    /// Veto hook invoked ahead of the decision bridge.
    fn should_start_load(&self, action: &NavigationAction) -> bool;

    /// A load began in the engine.
    fn on_started(&self);

    /// The engine finished loading; `ready_state` is the probed document
    /// ready state when the probe succeeded.
    fn on_finished(&self, ready_state: Option<&str>);

    /// The engine reported a load failure.
    fn on_failed(&self, error: &LoadError);

    /// Current progress estimate, `0.0..=1.0`.
    fn estimated_progress(&self) -> f64;
}

/// URL-keyed response cache consulted on connectivity failures.
pub trait ResponseCache: Send + Sync {
    /// The cached response body for `url`, when one exists.
    fn cached_body(&self, url: &Url) -> Option<String>;
}

/// The bridge's single concurrency contract: run a task on the engine's
/// execution context — inline when already there, otherwise dispatched
/// without blocking the caller.
pub trait EngineDispatcher: Send + Sync {
    fn is_on_engine_context(&self) -> bool;

    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Run `task` now if already on the engine context, else hand it over and
/// return.
pub(crate) fn run_or_dispatch(dispatcher: &dyn EngineDispatcher, task: Box<dyn FnOnce() + Send>) {
    if dispatcher.is_on_engine_context() {
        task();
    } else {
        dispatcher.dispatch(task);
    }
}

/// Dispatcher for embedders that already drive the bridge from the engine
/// context; every task runs inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl EngineDispatcher for InlineDispatcher {
    fn is_on_engine_context(&self) -> bool {
        true
    }

    fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}
