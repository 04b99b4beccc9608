//! Batch transport
//!
//! Two delivery modes with separate contracts:
//!
//! - **Interactive**: the request runs on smol's blocking pool and the caller
//!   gets a [`PendingResponse`] resolving to the response body.
//! - **Unload**: the page is going away. Delivery goes through one
//!   [`UnloadStrategy`], resolved once at construction from a ranked list
//!   (beacon first, synchronous request second). No response is read.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use crate::batch::Batch;
use crate::beacon::{send_beacon, BeaconData};
use crate::client::{ClientConfig, HttpClient, PostRequest, RequestSender};
use crate::origin::{classify_request, simple_headers_only, CorsCheck, CorsError, Origin};
use crate::NetError;

/// How a batch is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// Normal asynchronous request; the response is processed
    Interactive,
    /// Best-effort delivery during page teardown; the response is ignored
    Unload,
}

/// What happened to a batch handed to a transport
#[derive(Debug)]
pub enum SendOutcome {
    /// Interactive request in flight
    Pending(PendingResponse),
    /// Unload delivery handed off
    Dispatched { strategy: &'static str },
    /// The batch was dropped
    Failed(NetError),
}

/// Response body of an interactive send, once it arrives
///
/// Dropping it detaches the request rather than cancelling it.
#[derive(Debug)]
pub struct PendingResponse {
    inner: Pending,
}

#[derive(Debug)]
enum Pending {
    Task(Option<smol::Task<Result<String, NetError>>>),
    Ready(Option<Result<String, NetError>>),
}

impl PendingResponse {
    /// Wrap a running request
    pub fn from_task(task: smol::Task<Result<String, NetError>>) -> Self {
        Self { inner: Pending::Task(Some(task)) }
    }
    
    /// An already-known result
    pub fn ready(result: Result<String, NetError>) -> Self {
        Self { inner: Pending::Ready(Some(result)) }
    }
    
    /// Block the current thread until the response arrives
    pub fn wait(self) -> Result<String, NetError> {
        smol::block_on(self)
    }
}

impl Future for PendingResponse {
    type Output = Result<String, NetError>;
    
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let taken = || Err(NetError::Network("response already consumed".into()));
        match &mut self.inner {
            Pending::Task(slot) => {
                let Some(task) = slot.as_mut() else {
                    return Poll::Ready(taken());
                };
                let output = ready!(Pin::new(task).poll(cx));
                *slot = None;
                Poll::Ready(output)
            }
            Pending::Ready(value) => Poll::Ready(value.take().unwrap_or_else(taken)),
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        if let Pending::Task(slot) = &mut self.inner {
            if let Some(task) = slot.take() {
                task.detach();
            }
        }
    }
}

/// Turns batches into network requests
pub trait Transport: Send + Sync {
    fn send(&self, batch: Batch, mode: SendMode) -> SendOutcome;
}

/// What the host page can do at unload time
#[derive(Debug, Clone)]
pub struct HostCapabilities {
    /// A fire-and-forget delivery primitive is available
    pub beacon: bool,
    /// URL of the tracked page, for origin checks
    pub page_url: Option<String>,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            beacon: true,
            page_url: None,
        }
    }
}

/// One way of getting the final batch out during unload
pub trait UnloadStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    
    fn is_supported(&self, caps: &HostCapabilities) -> bool;
    
    /// Hand the batch off. Must not wait for a response body.
    fn deliver(&self, endpoint: &str, batch: &Batch) -> Result<(), NetError>;
}

/// Beacon delivery: `text/plain` JSON, never blocks
pub struct BeaconStrategy {
    sender: Arc<dyn RequestSender>,
    timeout: Duration,
}

impl BeaconStrategy {
    pub fn new(sender: Arc<dyn RequestSender>, timeout: Duration) -> Self {
        Self { sender, timeout }
    }
}

impl UnloadStrategy for BeaconStrategy {
    fn name(&self) -> &'static str {
        "beacon"
    }
    
    fn is_supported(&self, caps: &HostCapabilities) -> bool {
        caps.beacon
    }
    
    fn deliver(&self, endpoint: &str, batch: &Batch) -> Result<(), NetError> {
        let data = BeaconData::Text(batch.to_text_json());
        if send_beacon(Arc::clone(&self.sender), endpoint, data, self.timeout) {
            Ok(())
        } else {
            Err(NetError::BeaconRejected(endpoint.to_string()))
        }
    }
}

/// Synchronous form POST bounded by a short timeout
///
/// The one sanctioned blocking call: used when no beacon is available.
pub struct SyncRequestStrategy {
    sender: Arc<dyn RequestSender>,
    timeout: Duration,
    page_origin: Option<Origin>,
}

impl SyncRequestStrategy {
    pub fn new(sender: Arc<dyn RequestSender>, timeout: Duration, page_origin: Option<Origin>) -> Self {
        Self { sender, timeout, page_origin }
    }
}

impl UnloadStrategy for SyncRequestStrategy {
    fn name(&self) -> &'static str {
        "sync-request"
    }
    
    fn is_supported(&self, _caps: &HostCapabilities) -> bool {
        true
    }
    
    fn deliver(&self, endpoint: &str, batch: &Batch) -> Result<(), NetError> {
        let headers = form_headers(self.page_origin.as_ref(), endpoint)?;
        let request = PostRequest::new(endpoint, batch.to_form().into_bytes(), self.timeout)
            .with_headers(headers);
        self.sender.post(&request).map(|_| ())
    }
}

/// First supported strategy of a ranked list
pub fn select_unload_strategy(
    ranked: Vec<Box<dyn UnloadStrategy>>,
    caps: &HostCapabilities,
) -> Option<Box<dyn UnloadStrategy>> {
    ranked.into_iter().find(|s| s.is_supported(caps))
}

/// Headers for a form POST from `page_origin` to `endpoint`
///
/// Cross-origin requests keep only CORS-safelisted headers.
fn form_headers(page_origin: Option<&Origin>, endpoint: &str) -> Result<Vec<(String, String)>, CorsError> {
    let headers = vec![
        ("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string()),
        ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
    ];
    
    match classify_request(page_origin, endpoint, "POST", &headers) {
        CorsCheck::SameOrigin | CorsCheck::SimpleRequest => Ok(headers),
        CorsCheck::PreflightRequired => {
            let headers = simple_headers_only(headers);
            match classify_request(page_origin, endpoint, "POST", &headers) {
                CorsCheck::PreflightRequired => Err(CorsError::PreflightRequired(endpoint.to_string())),
                _ => Ok(headers),
            }
        }
    }
}

/// HTTP transport to a collection endpoint
pub struct HttpTransport {
    endpoint: String,
    page_origin: Option<Origin>,
    sender: Arc<dyn RequestSender>,
    request_timeout: Duration,
    unload: Box<dyn UnloadStrategy>,
}

impl HttpTransport {
    /// Build a transport, resolving the unload strategy against `caps`
    pub fn new(
        endpoint: &str,
        sender: Arc<dyn RequestSender>,
        config: &ClientConfig,
        caps: &HostCapabilities,
    ) -> Self {
        let page_origin = caps.page_url.as_deref().and_then(Origin::from_url);
        
        let ranked: Vec<Box<dyn UnloadStrategy>> = vec![
            Box::new(BeaconStrategy::new(Arc::clone(&sender), config.unload_timeout)),
            Box::new(SyncRequestStrategy::new(Arc::clone(&sender), config.unload_timeout, page_origin.clone())),
        ];
        let unload = select_unload_strategy(ranked, caps).unwrap_or_else(|| {
            Box::new(SyncRequestStrategy::new(Arc::clone(&sender), config.unload_timeout, page_origin.clone()))
        });
        tracing::debug!("Transport to {} using {} at unload", endpoint, unload.name());
        
        Self {
            endpoint: endpoint.to_string(),
            page_origin,
            sender,
            request_timeout: config.request_timeout,
            unload,
        }
    }
    
    /// Build a transport backed by a fresh reqwest client
    pub fn connect(endpoint: &str, caps: &HostCapabilities) -> Result<Self, NetError> {
        Self::connect_with(endpoint, caps, ClientConfig::default())
    }
    
    pub fn connect_with(endpoint: &str, caps: &HostCapabilities, config: ClientConfig) -> Result<Self, NetError> {
        let client = HttpClient::with_config(config.clone())?;
        Ok(Self::new(endpoint, Arc::new(client), &config, caps))
    }
    
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
    
    /// Name of the resolved unload strategy
    pub fn unload_strategy(&self) -> &'static str {
        self.unload.name()
    }
}

impl Transport for HttpTransport {
    fn send(&self, batch: Batch, mode: SendMode) -> SendOutcome {
        match mode {
            SendMode::Interactive => {
                let headers = match form_headers(self.page_origin.as_ref(), &self.endpoint) {
                    Ok(headers) => headers,
                    Err(err) => return SendOutcome::Failed(err.into()),
                };
                let request = PostRequest::new(&self.endpoint, batch.to_form().into_bytes(), self.request_timeout)
                    .with_headers(headers);
                let sender = Arc::clone(&self.sender);
                
                let task = smol::unblock(move || {
                    let response = sender.post(&request)?;
                    Ok(response.text().unwrap_or_default())
                });
                SendOutcome::Pending(PendingResponse::from_task(task))
            }
            SendMode::Unload => match self.unload.deliver(&self.endpoint, &batch) {
                Ok(()) => SendOutcome::Dispatched { strategy: self.unload.name() },
                Err(err) => SendOutcome::Failed(err),
            },
        }
    }
}
