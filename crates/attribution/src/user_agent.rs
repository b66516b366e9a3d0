//! Per-view network identity carriers.
//!
//! Outbound requests carry `"<platform default> _id/NNNNNN"` so that
//! request-inspection code can attribute a request back to the view that
//! issued it. The platform default is learned exactly once, from the first
//! outbound request the bridge observes; after that publish the template is
//! never mutated again and reads need no synchronization.

use std::sync::{Arc, OnceLock, Weak};

use crate::registry::ViewRegistry;
use crate::{AttributedView, ViewId};

/// Marker separating the platform identity from the view identity field.
pub const AGENT_ID_MARKER: &str = "_id/";

/// Width of the zero-padded decimal identity field.
pub const AGENT_ID_DIGITS: usize = 6;

/// Broad device class, used only to pick the fallback identity template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    Phone,
    Tablet,
}

impl DeviceClass {
    fn fallback_template(self) -> &'static str {
        match self {
            DeviceClass::Phone => {
                "Mozilla/5.0 (Mobile) AppleWebKit/537.36 (KHTML, like Gecko) Mobile Safari/537.36"
            }
            DeviceClass::Tablet => {
                "Mozilla/5.0 (Tablet) AppleWebKit/537.36 (KHTML, like Gecko) Safari/537.36"
            }
        }
    }
}

/// Identity handed to a newly created view.
#[derive(Debug, Clone)]
pub struct IssuedIdentity {
    /// The registered identity.
    pub id: ViewId,
    /// Generated carrier string; `None` while the view rides on the
    /// platform default (bootstrap window).
    pub user_agent: Option<String>,
}

/// Derives per-view carrier strings from a publish-once identity template.
pub struct UserAgentIssuer {
    registry: Arc<ViewRegistry>,
    device_class: DeviceClass,
    template: OnceLock<String>,
}

impl UserAgentIssuer {
    pub fn new(registry: Arc<ViewRegistry>, device_class: DeviceClass) -> Self {
        Self {
            registry,
            device_class,
            template: OnceLock::new(),
        }
    }

    /// Issuer bound to the process-wide registry.
    pub fn shared() -> Arc<UserAgentIssuer> {
        static SHARED: OnceLock<Arc<UserAgentIssuer>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                Arc::new(UserAgentIssuer::new(
                    ViewRegistry::shared(),
                    DeviceClass::default(),
                ))
            })
            .clone()
    }

    /// The registry this issuer assigns identities from.
    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    /// Record the platform-default identity observed on the first outbound
    /// request. Only the first call publishes; later calls are ignored.
    pub fn learn_template(&self, platform_default: &str) {
        if self.template.set(platform_default.to_owned()).is_ok() {
            log::info!("learned platform identity template");
        }
    }

    /// Whether the shared template has been published yet.
    pub fn template_learned(&self) -> bool {
        self.template.get().is_some()
    }

    /// Render the carrier for `id` behind the fixed marker. Requires the
    /// template to already be learned.
    pub fn generate_for(&self, id: ViewId) -> Option<String> {
        let template = self.template.get()?;
        Some(format!(
            "{} {}{:06}",
            template,
            AGENT_ID_MARKER,
            id.value()
        ))
    }

    /// Register a new view and derive its carrier.
    ///
    /// Views created before the template is learned are bound to the
    /// bootstrap identity and keep the platform default as-is. A second
    /// view racing the first request publishes the fallback template so
    /// every later view still obtains a carrier; uniqueness inside that
    /// narrow window is best-effort only.
    pub fn issue(&self, view: Weak<dyn AttributedView>) -> IssuedIdentity {
        if self.template_learned() {
            let id = self.registry.assign(view);
            IssuedIdentity {
                id,
                user_agent: self.generate_for(id),
            }
        } else {
            let sequence = self.registry.bind_bootstrap(view);
            if sequence > 1 {
                log::warn!(
                    "view #{} created before the identity template was learned; publishing fallback",
                    sequence
                );
                let _ = self
                    .template
                    .set(self.device_class.fallback_template().to_owned());
            }
            IssuedIdentity {
                id: ViewId::BOOTSTRAP,
                user_agent: None,
            }
        }
    }
}
