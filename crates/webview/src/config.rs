/// When a view's attribution counter returns to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributionResetPolicy {
    /// Reset when the view starts a new top-level navigation.
    #[default]
    PerNavigation,
    /// Accumulate across the view's full lifetime.
    Lifetime,
}

/// Configuration for the legacy webview bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL prefix of the application's internal service endpoints.
    /// Documents served from under this prefix never overwrite the
    /// captured page title.
    pub internal_base: Option<String>,
    /// Minimum cached body size eligible for offline recovery, in bytes.
    /// A connectivity failure with a strictly larger cached body loads the
    /// cached copy instead of surfacing the failure.
    pub offline_cache_min_bytes: usize,
    /// When attribution counters reset.
    pub attribution_reset: AttributionResetPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            internal_base: None,
            offline_cache_min_bytes: 100,
            attribution_reset: AttributionResetPolicy::PerNavigation,
        }
    }
}

impl BridgeConfig {
    /// Whether `location` points at an internal service endpoint.
    pub(crate) fn is_internal(&self, location: &str) -> bool {
        self.internal_base
            .as_deref()
            .map_or(false, |base| location.starts_with(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_base_is_a_prefix_match() {
        let config = BridgeConfig {
            internal_base: Some("http://localhost:6571/".to_string()),
            ..BridgeConfig::default()
        };
        assert!(config.is_internal("http://localhost:6571/errors/netError.html"));
        assert!(!config.is_internal("https://example.com/"));

        assert!(!BridgeConfig::default().is_internal("http://localhost:6571/"));
    }
}
