//! The legacy webview bridge.
//!
//! [`LegacyWebView`] wraps one rendering surface of a synchronous,
//! inline-callback engine and speaks the asynchronous four-phase
//! navigation protocol to its delegate: decide, commit, finish or fail.
//! Engine callbacks arrive on the engine's execution context and flow
//! through here; every emission ends by refreshing the observable
//! snapshot.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use url::Url;

use lantern_attribution::{
    AttributedView, AttributionCounter, IssuedIdentity, UserAgentIssuer, ViewId,
};

use crate::config::{AttributionResetPolicy, BridgeConfig};
use crate::engine::{
    run_or_dispatch, EngineDispatcher, InlineDispatcher, ProgressCoordinator, RenderEngine,
    ResponseCache,
};
use crate::error::{LoadError, WebViewError};
use crate::load_state::{LoadStateTracker, NavigationSnapshot};
use crate::navigation::{
    CyclePhase, DecisionSink, NavigationAction, NavigationDelegate, PolicyDecision,
};
use crate::request::LoadRequest;
use crate::script::{self, ScriptResult};

const PAGE_INFO_PROBE: &str = "document.readyState.toLowerCase() + '|' + document.title";
const DOCUMENT_LOCATION_PROBE: &str = "document.location.href";
const DOCUMENT_TITLE_PROBE: &str = "document.title";

/// Hook run once while the view is being released.
pub type TeardownHook = Box<dyn FnOnce(ViewId) -> Result<(), WebViewError> + Send>;

/// Lock-guarded navigation state owned by the view.
#[derive(Default)]
struct NavigationState {
    phase: CyclePhase,
    canonical_url: Option<Url>,
    previous_url: Option<Url>,
    title: String,
    /// Document location recorded at the previous finish emission.
    prev_document_location: String,
    /// Fallback for unresolved decision sinks; last explicitly resolved.
    last_decision: PolicyDecision,
    tracker: LoadStateTracker,
}

/// One legacy rendering surface, bridged to the asynchronous navigation
/// protocol and registered for request attribution.
pub struct LegacyWebView {
    id: ViewId,
    user_agent: Option<String>,
    engine: Arc<dyn RenderEngine>,
    dispatcher: Arc<dyn EngineDispatcher>,
    progress: Option<Arc<dyn ProgressCoordinator>>,
    cache: Option<Arc<dyn ResponseCache>>,
    delegate: RwLock<Option<Weak<dyn NavigationDelegate>>>,
    issuer: Arc<UserAgentIssuer>,
    config: BridgeConfig,
    nav: Mutex<NavigationState>,
    snapshot: RwLock<NavigationSnapshot>,
    attribution: AttributionCounter,
    teardown: Mutex<Option<TeardownHook>>,
}

impl LegacyWebView {
    pub fn builder(engine: Arc<dyn RenderEngine>) -> LegacyWebViewBuilder {
        LegacyWebViewBuilder::new(engine)
    }

    /// Stable identity assigned at creation.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Generated outbound identity carrier; `None` while this view rides
    /// on the platform default (bootstrap window).
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// The observable navigation state, refreshed at every emission point.
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshot.read().clone()
    }

    /// Canonical URL of the current navigation.
    pub fn url(&self) -> Option<Url> {
        self.snapshot.read().url.clone()
    }

    /// Canonical URL of the previous navigation.
    pub fn previous_url(&self) -> Option<Url> {
        self.nav.lock().previous_url.clone()
    }

    pub fn title(&self) -> String {
        self.snapshot.read().title.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.read().is_loading
    }

    pub fn can_go_back(&self) -> bool {
        self.snapshot.read().can_go_back
    }

    pub fn can_go_forward(&self) -> bool {
        self.snapshot.read().can_go_forward
    }

    /// Install the navigation delegate. Held weakly; the embedder keeps
    /// ownership.
    pub fn set_navigation_delegate(&self, delegate: Arc<dyn NavigationDelegate>) {
        *self.delegate.write() = Some(Arc::downgrade(&delegate));
    }

    pub fn clear_navigation_delegate(&self) {
        *self.delegate.write() = None;
    }

    fn delegate(&self) -> Option<Arc<dyn NavigationDelegate>> {
        self.delegate.read().as_ref().and_then(Weak::upgrade)
    }

    /// Decide whether the engine may start loading `action`.
    ///
    /// The decision must be known before this returns: the delegate's
    /// completion sink is read synchronously and an unresolved sink falls
    /// back to the last explicitly resolved decision (initially allow).
    /// An accepted top-frame request begins a new navigation cycle; a
    /// change of target also moves the canonical URL.
    pub fn should_start_load(&self, action: &NavigationAction) -> bool {
        let request = &action.request;

        // The first outbound request reveals the platform-default
        // identity template.
        if !self.issuer.template_learned() {
            if let Some(user_agent) = request.header("User-Agent") {
                self.issuer.learn_template(user_agent);
            }
        }

        if let Some(progress) = &self.progress {
            if !progress.should_start_load(action) {
                log::debug!("view {}: load vetoed by progress collaborator", self.id);
                return false;
            }
        }

        let decision = self.bridge_decision(action);

        if decision.is_allowed() && request.is_top_frame() {
            self.begin_cycle(request.url().clone());
        }

        self.refresh_snapshot();
        decision.is_allowed()
    }

    /// Engine callback: a load began. Commits the cycle at most once.
    pub fn engine_did_start(&self) {
        if let Some(progress) = &self.progress {
            progress.on_started();
        }

        let commit = {
            let mut nav = self.nav.lock();
            if nav.phase == CyclePhase::Started {
                nav.phase = CyclePhase::Committed;
                true
            } else {
                false
            }
        };
        if commit {
            if let Some(delegate) = self.delegate() {
                delegate.did_commit(self.id);
            }
        }

        self.refresh_snapshot();
    }

    /// Engine callback: the load finished.
    ///
    /// Forwards the probed document ready state to the progress
    /// collaborator, then runs terminal bookkeeping: the latch makes the
    /// finish emission idempotent per cycle, and a document location
    /// unchanged since the previous finish emits nothing (in-page
    /// navigation).
    pub fn engine_did_finish(&self) {
        let ready_state = self.probe_page_info();
        if let Some(progress) = &self.progress {
            progress.on_finished(ready_state.as_deref());
        }

        self.complete_loading();
        self.refresh_snapshot();
    }

    /// Engine callback: a load failed.
    ///
    /// Only a failure of the main document surfaces to the delegate;
    /// sub-resource failures are swallowed so the cycle can still finish.
    /// A connectivity loss with a sufficiently large cached body loads the
    /// cached copy instead of failing. The terminal latch makes the
    /// failure emission idempotent per cycle: once either terminal event
    /// has fired, late or duplicate failure callbacks change nothing.
    pub fn engine_did_fail(&self, error: &LoadError) {
        if let Some(failing_url) = error.failing_url() {
            self.complete_failure(failing_url, error);
        }

        if let Some(progress) = &self.progress {
            progress.on_failed(error);
        }
        self.refresh_snapshot();
    }

    /// Ask the engine to load `request`.
    pub fn load_request(&self, request: &LoadRequest) {
        self.engine.load_request(request);
    }

    pub fn stop_loading(&self) {
        self.engine.stop_loading();
    }

    pub fn reload(&self) {
        self.engine.reload();
    }

    /// The legacy engine has no cache-bypassing reload; same as `reload`.
    pub fn reload_from_origin(&self) {
        self.engine.reload();
    }

    pub fn go_back(&self) {
        self.engine.go_back();
    }

    pub fn go_forward(&self) {
        self.engine.go_forward();
    }

    /// Evaluate `script` on the engine context and hand the decoded result
    /// to `completion`. Runs inline when already on the engine context,
    /// otherwise the evaluation is dispatched and this returns.
    pub fn evaluate_script(
        &self,
        script: &str,
        completion: impl FnOnce(Option<ScriptResult>) + Send + 'static,
    ) {
        let engine = self.engine.clone();
        let wrapped = script::wrap_for_transport(script);
        run_or_dispatch(
            self.dispatcher.as_ref(),
            Box::new(move || {
                completion(script::decode(engine.evaluate_script(&wrapped)));
            }),
        );
    }

    /// Release the view's registry entry and run the teardown hook once.
    /// Faults are logged, never propagated; teardown always completes.
    pub fn close(&self) {
        self.issuer.registry().release(self.id);
        if let Some(hook) = self.teardown.lock().take() {
            if let Err(error) = hook(self.id) {
                log::error!("view {}: teardown hook failed: {}", self.id, error);
            }
        }
    }

    // Begin a navigation cycle for an accepted top-frame request. Any
    // phase moves back to `Started`; the canonical URL only moves when the
    // target actually changed.
    fn begin_cycle(&self, url: Url) {
        {
            let mut nav = self.nav.lock();
            if nav.canonical_url.as_ref() != Some(&url) {
                nav.previous_url = nav.canonical_url.take();
                nav.canonical_url = Some(normalize_canonical(url));
            }
            nav.phase = CyclePhase::Started;
            nav.tracker.enter_started();
        }
        if self.config.attribution_reset == AttributionResetPolicy::PerNavigation {
            self.attribution.reset();
        }
        log::debug!("view {}: navigation started", self.id);
    }

    fn bridge_decision(&self, action: &NavigationAction) -> PolicyDecision {
        let sink = DecisionSink::new();
        if let Some(delegate) = self.delegate() {
            delegate.decide_policy(self.id, action, sink.clone());
        }
        let mut nav = self.nav.lock();
        match sink.resolved() {
            Some(decision) => {
                nav.last_decision = decision;
                decision
            }
            // Never resolved synchronously; there is no suspension point
            // at this boundary, so the last resolved decision stands.
            None => nav.last_decision,
        }
    }

    fn probe_page_info(&self) -> Option<String> {
        let info = self.engine.evaluate_script(PAGE_INFO_PROBE)?;
        let parts: Vec<&str> = info.split('|').collect();
        if parts.len() > 1 {
            if let Some(title) = parts.last().filter(|title| !title.is_empty()) {
                self.nav.lock().title = (*title).to_string();
            }
        }
        parts.first().map(|ready_state| (*ready_state).to_string())
    }

    fn complete_loading(&self) {
        {
            let mut nav = self.nav.lock();
            if nav.tracker.is_terminal() {
                return;
            }
            nav.tracker.latch_terminal();
            nav.phase = CyclePhase::Terminal;
        }

        let Some(location) = self.engine.evaluate_script(DOCUMENT_LOCATION_PROBE) else {
            return;
        };

        let (changed, refresh_title) = {
            let nav = self.nav.lock();
            let changed = location != nav.prev_document_location;
            let canonical_is_internal = nav
                .canonical_url
                .as_ref()
                .map_or(false, |url| self.config.is_internal(url.as_str()));
            let refresh_title =
                changed && !canonical_is_internal && !self.config.is_internal(&location);
            (changed, refresh_title)
        };

        if refresh_title {
            let title = self
                .engine
                .evaluate_script(DOCUMENT_TITLE_PROBE)
                .filter(|title| !title.is_empty())
                .or_else(|| host_of(&location))
                .unwrap_or_default();
            self.nav.lock().title = title;
        }

        if changed {
            log::debug!("view {}: finished loading {}", self.id, location);
            if let Some(delegate) = self.delegate() {
                delegate.did_finish(self.id);
            }
        }

        self.nav.lock().prev_document_location = location;
    }

    fn complete_failure(&self, failing_url: &Url, error: &LoadError) {
        {
            let nav = self.nav.lock();
            if nav.tracker.is_terminal() {
                return;
            }
        }

        let mut handled = false;
        if error.is_connectivity() {
            if let Some(body) = self.cached_fallback(failing_url) {
                log::info!(
                    "view {}: serving cached copy of {} after connectivity loss",
                    self.id,
                    failing_url
                );
                self.engine.load_html(&body, failing_url);
                handled = true;
            }
        }

        let top_frame = {
            let nav = self.nav.lock();
            nav.canonical_url.as_ref() == Some(failing_url)
        };

        if handled || top_frame {
            let mut nav = self.nav.lock();
            nav.tracker.latch_terminal();
            nav.phase = CyclePhase::Terminal;
        }

        if !handled && top_frame {
            log::warn!("view {}: navigation failed: {}", self.id, error);
            if let Some(delegate) = self.delegate() {
                delegate.did_fail(self.id, error);
            }
        }
    }

    fn cached_fallback(&self, url: &Url) -> Option<String> {
        let body = self.cache.as_ref()?.cached_body(url)?;
        (body.len() > self.config.offline_cache_min_bytes).then_some(body)
    }

    // Mirror the observable state. Runs at every emission point so a
    // reader never sees the snapshot half-updated.
    fn refresh_snapshot(&self) {
        let estimated_progress = self
            .progress
            .as_ref()
            .map_or(0.0, |progress| progress.estimated_progress());
        let mut nav = self.nav.lock();
        nav.tracker.refresh(self.engine.as_ref());
        let snapshot = NavigationSnapshot {
            url: nav.canonical_url.clone(),
            title: nav.title.clone(),
            is_loading: nav.tracker.is_loading(),
            can_go_back: nav.tracker.can_go_back(),
            can_go_forward: nav.tracker.can_go_forward(),
            estimated_progress,
        };
        drop(nav);
        *self.snapshot.write() = snapshot;
    }
}

impl AttributedView for LegacyWebView {
    fn identity(&self) -> ViewId {
        self.id
    }

    fn attribution(&self) -> &AttributionCounter {
        &self.attribution
    }
}

impl Drop for LegacyWebView {
    fn drop(&mut self) {
        self.close();
    }
}

// An empty query separator carries no information; drop it before the URL
// becomes canonical.
fn normalize_canonical(mut url: Url) -> Url {
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

fn host_of(location: &str) -> Option<String> {
    Url::parse(location)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
}

/// Builder wiring a [`LegacyWebView`] to its collaborators.
pub struct LegacyWebViewBuilder {
    engine: Arc<dyn RenderEngine>,
    dispatcher: Arc<dyn EngineDispatcher>,
    progress: Option<Arc<dyn ProgressCoordinator>>,
    cache: Option<Arc<dyn ResponseCache>>,
    issuer: Option<Arc<UserAgentIssuer>>,
    config: BridgeConfig,
    teardown: Option<TeardownHook>,
}

impl LegacyWebViewBuilder {
    fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            dispatcher: Arc::new(InlineDispatcher),
            progress: None,
            cache: None,
            issuer: None,
            config: BridgeConfig::default(),
            teardown: None,
        }
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn EngineDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressCoordinator>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn response_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Identity issuer to register with; defaults to the process-wide one.
    pub fn issuer(mut self, issuer: Arc<UserAgentIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_teardown(mut self, hook: TeardownHook) -> Self {
        self.teardown = Some(hook);
        self
    }

    pub fn build(self) -> Arc<LegacyWebView> {
        let issuer = self.issuer.unwrap_or_else(UserAgentIssuer::shared);
        Arc::new_cyclic(|weak: &Weak<LegacyWebView>| {
            let handle: Weak<dyn AttributedView> = weak.clone();
            let IssuedIdentity { id, user_agent } = issuer.issue(handle);
            LegacyWebView {
                id,
                user_agent,
                engine: self.engine,
                dispatcher: self.dispatcher,
                progress: self.progress,
                cache: self.cache,
                delegate: RwLock::new(None),
                issuer,
                config: self.config,
                nav: Mutex::new(NavigationState::default()),
                snapshot: RwLock::new(NavigationSnapshot::default()),
                attribution: AttributionCounter::new(),
                teardown: Mutex::new(self.teardown),
            }
        })
    }
}
