//! End-to-end identity pipeline: views are issued carriers, outbound
//! requests are resolved back through their tokens, and attribution
//! notifications reach a registered observer.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use lantern_attribution::{
    AttributedView, AttributionCounter, AttributionObserver, RequestAttribution, UserAgentIssuer,
    ViewId, ViewRegistry,
};

struct StubView {
    identity: ViewId,
    user_agent: Option<String>,
    attribution: AttributionCounter,
}

impl StubView {
    fn create(issuer: &UserAgentIssuer) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<StubView>| {
            let handle: Weak<dyn AttributedView> = weak.clone();
            let issued = issuer.issue(handle);
            StubView {
                identity: issued.id,
                user_agent: issued.user_agent,
                attribution: AttributionCounter::new(),
            }
        })
    }
}

impl AttributedView for StubView {
    fn identity(&self) -> ViewId {
        self.identity
    }

    fn attribution(&self) -> &AttributionCounter {
        &self.attribution
    }
}

#[derive(Default)]
struct CountingObserver {
    notifications: Mutex<Vec<ViewId>>,
}

impl AttributionObserver for CountingObserver {
    fn on_attributed_request(&self, view: ViewId, _count: u64) {
        self.notifications.lock().push(view);
    }
}

const PLATFORM_DEFAULT: &str = "Mozilla/5.0 (Mobile) AppleWebKit/537.36 (KHTML, like Gecko)";

#[test_log::test]
fn carriers_round_trip_to_attribution_notifications() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = UserAgentIssuer::new(registry.clone(), Default::default());

    // The bootstrap view exists before any template is known.
    let bootstrap = StubView::create(&issuer);
    assert_eq!(bootstrap.identity(), ViewId::BOOTSTRAP);
    assert!(bootstrap.user_agent.is_none());

    // The first outbound request teaches the issuer the platform default.
    issuer.learn_template(PLATFORM_DEFAULT);

    let second = StubView::create(&issuer);
    let carrier = second.user_agent.clone().expect("post-learn views carry a token");
    assert_eq!(carrier, format!("{} _id/000002", PLATFORM_DEFAULT));

    let attribution = RequestAttribution::new(registry.clone());
    let observer = Arc::new(CountingObserver::default());
    attribution.observe(observer.clone());

    // Request inspection resolves the carrier and attributes the request.
    let (view, count) = attribution.record_token(&carrier).unwrap();
    assert_eq!(view, second.identity());
    assert_eq!(count, 1);
    assert_eq!(second.attribution.current(), 1);

    // A tokenless carrier lands on the bootstrap view.
    let (view, _) = attribution.record_token(PLATFORM_DEFAULT).unwrap();
    assert_eq!(view, ViewId::BOOTSTRAP);

    assert_eq!(*observer.notifications.lock(), vec![second.identity(), ViewId::BOOTSTRAP]);
}

#[test_log::test]
fn released_views_stop_attributing() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = UserAgentIssuer::new(registry.clone(), Default::default());
    issuer.learn_template(PLATFORM_DEFAULT);

    let view = StubView::create(&issuer);
    let id = view.identity();
    let carrier = view.user_agent.clone().unwrap();

    let attribution = RequestAttribution::new(registry.clone());
    assert!(attribution.record_token(&carrier).is_ok());

    drop(view);
    // The dead entry resolves to nothing even before an explicit release.
    assert!(attribution.record(id).is_err());
    registry.release(id);
    assert!(attribution.record_token(&carrier).is_err());
}
