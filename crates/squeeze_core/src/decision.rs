//! Redirect decision engine and compressed-URL construction.

use url::Url;

use crate::{Config, DedupSet};

/// Host platform's classification of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    ImageSet,
    XmlHttpRequest,
    MainFrame,
    SubFrame,
    Other,
}

impl ResourceType {
    /// Types that can carry an image payload.
    pub fn is_image_bearing(self) -> bool {
        matches!(
            self,
            ResourceType::Image | ResourceType::ImageSet | ResourceType::XmlHttpRequest
        )
    }
}

/// Facts about one intercepted request, as delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFacts {
    pub url: String,
    pub document_url: String,
    pub resource_type: ResourceType,
}

/// Hostname of `document_url`, or `None` when it does not parse.
pub fn page_host_of(document_url: &str) -> Option<String> {
    let parsed = Url::parse(document_url).ok()?;
    parsed.host_str().map(str::to_owned)
}

/// Decides whether `facts` should be rerouted through the compression proxy.
///
/// On a positive decision the request URL is recorded in `compressed` before
/// returning, so the same URL redirects at most once per page view.
/// Ambiguous input never errors; it degrades to `false`.
pub fn should_compress(
    facts: &RequestFacts,
    page_host: &str,
    config: &Config,
    compressed: &mut DedupSet,
) -> bool {
    if !config.enabled || config.proxy_url.is_empty() {
        return false;
    }
    if !facts.resource_type.is_image_bearing() {
        return false;
    }
    // A request already pointing at the proxy must never redirect again.
    if facts.url.starts_with(config.proxy_url.as_str()) {
        return false;
    }
    if compressed.contains(&facts.url) {
        return false;
    }
    if config.is_disabled_host(page_host) {
        return false;
    }
    compressed.insert(facts.url.clone());
    true
}

/// Composes the proxy request for `url`.
///
/// Parameter order is fixed and part of the wire contract with the proxy:
/// `url`, `jpeg`, `bw`, `l`. The original URL is form-urlencoded so the
/// proxy recovers it exactly. `jpeg=1` asks for JPEG output on platforms
/// that cannot decode WebP.
pub fn build_compress_url(url: &str, config: &Config) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
    format!(
        "{}?url={}&jpeg={}&bw={}&l={}",
        config.proxy_url,
        encoded,
        if config.is_webp_supported { 0 } else { 1 },
        if config.convert_bw { 1 } else { 0 },
        config.compression_level,
    )
}
