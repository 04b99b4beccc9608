//! Origins and CORS request classification
//!
//! Batches often go to a collector on another origin. Cross-origin sends
//! must stay "simple" requests: a safelisted method, safelisted headers, and
//! a safelisted content type, so the browser-side contract never waits on a
//! preflight.

use url::Url;

/// Scheme, host and port of a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl Origin {
    /// Build an origin; scheme and host are case-folded
    pub fn new(scheme: &str, host: &str, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.to_lowercase(),
            host: host.to_lowercase(),
            port,
        }
    }
    
    /// Parse origin from URL
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url.trim()).ok()?;
        let host = parsed.host_str()?;
        Some(Self::new(parsed.scheme(), host, parsed.port()))
    }
    
    /// Explicit port, or the scheme default
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| match self.scheme.as_str() {
            "http" | "ws" => 80,
            "https" | "wss" => 443,
            _ => 0,
        })
    }
    
    pub fn is_same_origin(&self, other: &Origin) -> bool {
        self.scheme == other.scheme
            && self.host == other.host
            && self.effective_port() == other.effective_port()
    }
}

/// How a request relates to the page origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsCheck {
    /// Same scheme, host and port
    SameOrigin,
    /// Cross-origin, sent without preflight
    SimpleRequest,
    /// Cross-origin, would be preceded by an OPTIONS request
    PreflightRequired,
}

/// CORS errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorsError {
    #[error("Request to {0} would require a CORS preflight")]
    PreflightRequired(String),
}

/// Simple (CORS-safelisted) methods that don't require preflight
const SIMPLE_METHODS: &[&str] = &["GET", "HEAD", "POST"];

/// Simple (CORS-safelisted) headers that don't require preflight
const SIMPLE_HEADERS: &[&str] = &[
    "accept",
    "accept-language",
    "content-language",
    "content-type",
];

/// Simple content types for POST
const SIMPLE_CONTENT_TYPES: &[&str] = &[
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
];

/// Check if a content type is CORS-safelisted
pub fn is_simple_content_type(value: &str) -> bool {
    let content_type = value.split(';').next().unwrap_or("").trim().to_lowercase();
    SIMPLE_CONTENT_TYPES.contains(&content_type.as_str())
}

/// Check if a header (name and value) is CORS-safelisted
pub fn is_simple_header(name: &str, value: &str) -> bool {
    let name_lower = name.to_lowercase();
    if !SIMPLE_HEADERS.contains(&name_lower.as_str()) {
        return false;
    }
    name_lower != "content-type" || is_simple_content_type(value)
}

/// Check if request qualifies as simple (no preflight needed)
pub fn is_simple_request(method: &str, headers: &[(String, String)]) -> bool {
    let method_upper = method.to_uppercase();
    SIMPLE_METHODS.contains(&method_upper.as_str())
        && headers.iter().all(|(name, value)| is_simple_header(name, value))
}

/// Classify a request from `page` to `target`
///
/// An unknown page origin is treated as cross-origin.
pub fn classify_request(
    page: Option<&Origin>,
    target_url: &str,
    method: &str,
    headers: &[(String, String)],
) -> CorsCheck {
    if let (Some(origin), Some(target)) = (page, Origin::from_url(target_url)) {
        if origin.is_same_origin(&target) {
            return CorsCheck::SameOrigin;
        }
    }
    
    if is_simple_request(method, headers) {
        CorsCheck::SimpleRequest
    } else {
        CorsCheck::PreflightRequired
    }
}

/// Drop the headers that would turn a cross-origin request into a preflighted one
pub fn simple_headers_only(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers.into_iter()
        .filter(|(name, value)| is_simple_header(name, value))
        .collect()
}
