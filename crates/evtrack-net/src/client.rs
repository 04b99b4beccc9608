//! HTTP Client
//!
//! Blocking POST client built on reqwest. Callers that must not block run it
//! on smol's blocking pool.

use std::time::Duration;

use reqwest::header::HeaderMap;
use url::Url;

use crate::{NetError, Response};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Timeout for interactive sends
    pub request_timeout: Duration,
    /// Upper bound for the synchronous send at unload time
    pub unload_timeout: Duration,
    /// Honour proxy settings from the environment
    pub system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("evtrack/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(30),
            unload_timeout: Duration::from_secs(2),
            system_proxy: true,
        }
    }
}

/// A single POST
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

impl PostRequest {
    pub fn new(url: &str, body: Vec<u8>, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            headers: Vec::new(),
            body,
            timeout,
        }
    }
    
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
    
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }
    
    /// Value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Something that can perform a blocking POST
///
/// Non-2xx statuses are reported as [`NetError::HttpError`].
pub trait RequestSender: Send + Sync {
    fn post(&self, request: &PostRequest) -> Result<Response, NetError>;
}

/// reqwest-backed sender
pub struct HttpClient {
    client: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self, NetError> {
        Self::with_config(ClientConfig::default())
    }
    
    /// Create with custom config
    pub fn with_config(config: ClientConfig) -> Result<Self, NetError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()
            .map_err(|e| NetError::Client(e.to_string()))?;
        
        Ok(Self { client, config })
    }
    
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl RequestSender for HttpClient {
    fn post(&self, request: &PostRequest) -> Result<Response, NetError> {
        let url = Url::parse(&request.url)
            .map_err(|e| NetError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        
        tracing::debug!("POST {} ({} bytes)", url, request.body.len());
        
        let mut builder = self.client.post(url)
            .timeout(request.timeout)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        
        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response.bytes().map_err(map_reqwest_error)?.to_vec();
        
        let response = Response { status, headers, body };
        if !response.is_success() {
            return Err(NetError::HttpError { status });
        }
        Ok(response)
    }
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers.iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

fn map_reqwest_error(err: reqwest::Error) -> NetError {
    if err.is_timeout() {
        NetError::Timeout
    } else {
        NetError::Network(err.to_string())
    }
}
