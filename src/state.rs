//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::LinkService;
use crate::infrastructure::cache::CacheGuard;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: services are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    /// Same guard the link service writes through; used for health checks.
    pub cache: Arc<CacheGuard>,
    /// Prefix of returned short URLs, without a trailing slash.
    pub base_url: String,
    /// When true, client IP is read from proxy headers.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        cache: Arc<CacheGuard>,
        base_url: impl Into<String>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service,
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            behind_proxy,
        }
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
