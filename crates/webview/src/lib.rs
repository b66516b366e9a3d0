//! Lantern Legacy WebView Bridge
//!
//! Runs applications written against an asynchronous, delegate-based
//! navigation protocol on top of an older synchronous-callback rendering
//! engine. The bridge translates the engine's inline load lifecycle into
//! discrete decide → commit → finish/fail events, reconciles the engine's
//! loading-state quirks into one consistent observable snapshot, and tags
//! every view with a stable identity so outbound requests can be
//! attributed back to the view that issued them.
//!
//! The rendering engine, progress estimation, response cache, and
//! execution-context dispatch are injected collaborators; see the traits
//! in [`engine`].

pub mod config;
pub mod engine;
pub mod error;
pub mod load_state;
pub mod navigation;
pub mod request;
pub mod script;
mod webview;

pub use config::{AttributionResetPolicy, BridgeConfig};
pub use engine::{
    EngineDispatcher, InlineDispatcher, ProgressCoordinator, RenderEngine, ResponseCache,
};
pub use error::{LoadError, WebViewError};
pub use load_state::NavigationSnapshot;
pub use navigation::{
    DecisionSink, NavigationAction, NavigationDelegate, PolicyDecision,
};
pub use request::{LoadRequest, NavigationType};
pub use script::ScriptResult;
pub use webview::{LegacyWebView, LegacyWebViewBuilder, TeardownHook};

/// Re-export of the identity and attribution layer for embedders.
pub use lantern_attribution as attribution;
pub use lantern_attribution::ViewId;
