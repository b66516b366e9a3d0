//! Request attribution across the bridge: carriers issued at view
//! creation, tokens resolved by request inspection, counters reset by new
//! navigations, and change notifications reaching an aggregator.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use url::Url;

use lantern_webview::attribution::{
    AttributedView, AttributionObserver, DeviceClass, RequestAttribution, UserAgentIssuer,
    ViewId, ViewRegistry,
};
use lantern_webview::{
    AttributionResetPolicy, BridgeConfig, LegacyWebView, LoadRequest, NavigationAction,
    NavigationType, RenderEngine,
};

const PLATFORM_UA: &str = "Mozilla/5.0 (Mobile) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Engine that does nothing; attribution never touches rendering.
struct InertEngine;

impl RenderEngine for InertEngine {
    fn is_loading(&self) -> bool {
        false
    }
    fn can_go_back(&self) -> bool {
        false
    }
    fn can_go_forward(&self) -> bool {
        false
    }
    fn evaluate_script(&self, _script: &str) -> Option<String> {
        None
    }
    fn load_request(&self, _request: &LoadRequest) {}
    fn load_html(&self, _html: &str, _base_url: &Url) {}
    fn stop_loading(&self) {}
    fn reload(&self) {}
    fn go_back(&self) {}
    fn go_forward(&self) {}
}

#[derive(Default)]
struct Aggregator {
    notifications: Mutex<Vec<(ViewId, u64)>>,
}

impl AttributionObserver for Aggregator {
    fn on_attributed_request(&self, view: ViewId, count: u64) {
        self.notifications.lock().push((view, count));
    }
}

fn top_frame(url_str: &str) -> NavigationAction {
    let url = Url::parse(url_str).unwrap();
    NavigationAction::new(
        LoadRequest::new(url.clone())
            .with_main_document_url(url)
            .with_header("User-Agent", PLATFORM_UA),
        NavigationType::LinkActivated,
    )
}

fn build_view(
    issuer: &Arc<UserAgentIssuer>,
    config: BridgeConfig,
) -> Arc<LegacyWebView> {
    LegacyWebView::builder(Arc::new(InertEngine))
        .issuer(issuer.clone())
        .config(config)
        .build()
}

#[test_log::test]
fn attributed_requests_notify_and_reset_per_navigation() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = Arc::new(UserAgentIssuer::new(registry.clone(), DeviceClass::Phone));
    issuer.learn_template(PLATFORM_UA);

    let view = build_view(&issuer, BridgeConfig::default());
    let carrier = view.user_agent().unwrap().to_string();

    let attribution = RequestAttribution::new(registry);
    let aggregator = Arc::new(Aggregator::default());
    attribution.observe(aggregator.clone());

    // Two blocked requests attributed through the carrier token.
    attribution.record_token(&carrier).unwrap();
    let (id, count) = attribution.record_token(&carrier).unwrap();
    assert_eq!(id, view.id());
    assert_eq!(count, 2);
    assert_eq!(
        *aggregator.notifications.lock(),
        vec![(view.id(), 1), (view.id(), 2)]
    );

    // A new top-level navigation resets the count.
    assert!(view.should_start_load(&top_frame("https://example.com/")));
    assert_eq!(view.attribution().current(), 0);

    let (_, count) = attribution.record_token(&carrier).unwrap();
    assert_eq!(count, 1);
}

#[test_log::test]
fn lifetime_policy_accumulates_across_navigations() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = Arc::new(UserAgentIssuer::new(registry.clone(), DeviceClass::Phone));
    issuer.learn_template(PLATFORM_UA);

    let config = BridgeConfig {
        attribution_reset: AttributionResetPolicy::Lifetime,
        ..BridgeConfig::default()
    };
    let view = build_view(&issuer, config);

    let attribution = RequestAttribution::new(registry);
    attribution.record(view.id()).unwrap();
    attribution.record(view.id()).unwrap();

    assert!(view.should_start_load(&top_frame("https://example.com/")));
    assert_eq!(view.attribution().current(), 2);
}

#[test_log::test]
fn two_views_attribute_independently() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = Arc::new(UserAgentIssuer::new(registry.clone(), DeviceClass::Phone));
    issuer.learn_template(PLATFORM_UA);

    let first = build_view(&issuer, BridgeConfig::default());
    let second = build_view(&issuer, BridgeConfig::default());
    assert_eq!(first.id().value(), 1);
    assert_eq!(second.id().value(), 2);

    let attribution = RequestAttribution::new(registry);
    attribution
        .record_token(&second.user_agent().unwrap().to_string())
        .unwrap();

    assert_eq!(first.attribution().current(), 0);
    assert_eq!(second.attribution().current(), 1);
}

#[test_log::test]
fn closed_views_drop_out_of_attribution() {
    let registry = Arc::new(ViewRegistry::new());
    let issuer = Arc::new(UserAgentIssuer::new(registry.clone(), DeviceClass::Phone));
    issuer.learn_template(PLATFORM_UA);

    let view = build_view(&issuer, BridgeConfig::default());
    let id = view.id();
    let carrier = view.user_agent().unwrap().to_string();

    let attribution = RequestAttribution::new(registry.clone());
    assert!(attribution.record(id).is_ok());

    drop(view);
    assert!(attribution.record(id).is_err());
    assert!(attribution.record_token(&carrier).is_err());
    // Drop released the registry slot as part of teardown.
    assert!(registry.is_empty());
}
