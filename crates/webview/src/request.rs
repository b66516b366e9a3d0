use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// How a navigation was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationType {
    LinkActivated,
    FormSubmitted,
    BackForward,
    Reload,
    FormResubmitted,
    Other,
}

/// A request the legacy engine is about to load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Target URL
    url: Url,
    /// URL of the navigation's main document
    main_document_url: Option<Url>,
    /// Request headers
    headers: HashMap<String, String>,
}

impl LoadRequest {
    /// Create a request for the given target URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            main_document_url: None,
            headers: HashMap::new(),
        }
    }

    /// Set the navigation's main-document URL, used for top-frame
    /// classification.
    pub fn with_main_document_url(mut self, url: Url) -> Self {
        self.main_document_url = Some(url);
        self
    }

    /// Add a header to the request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Get the target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the main-document URL, when known.
    pub fn main_document_url(&self) -> Option<&Url> {
        self.main_document_url.as_ref()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// A request is top-frame when it targets the navigation's main
    /// document.
    pub fn is_top_frame(&self) -> bool {
        self.main_document_url.as_ref() == Some(&self.url)
    }
}
