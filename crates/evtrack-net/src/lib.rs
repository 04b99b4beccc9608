//! evtrack Networking
//!
//! Wire encoding of batches, origin checks, the HTTP client, beacons, and
//! the transport that picks between interactive and unload delivery.

pub mod batch;
pub mod origin;
pub mod client;
pub mod beacon;
pub mod transport;

pub use batch::{Action, Batch, PageMetrics, INFO_SEPARATOR, FIELD_SEPARATOR};
pub use origin::{CorsCheck, CorsError, Origin};
pub use client::{ClientConfig, HttpClient, PostRequest, RequestSender};
pub use beacon::{send_beacon, BeaconData, BEACON_QUOTA};
pub use transport::{
    BeaconStrategy, HostCapabilities, HttpTransport, PendingResponse, SendMode, SendOutcome,
    SyncRequestStrategy, Transport, UnloadStrategy,
};

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Get body as text
    pub fn text(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }
    
    /// Check if response is successful
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Network error
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },
    
    #[error("Network error: {0}")]
    Network(String),
    
    #[error("Request timed out")]
    Timeout,
    
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    
    #[error("Beacon rejected: {0}")]
    BeaconRejected(String),
    
    #[error("HTTP client unavailable: {0}")]
    Client(String),
    
    #[error(transparent)]
    Cors(#[from] CorsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_response_is_success() {
        let resp = Response {
            status: 200,
            headers: vec![],
            body: b"42".to_vec(),
        };
        assert!(resp.is_success());
        assert_eq!(resp.text().as_deref(), Some("42"));
        
        let resp = Response {
            status: 404,
            headers: vec![],
            body: vec![],
        };
        assert!(!resp.is_success());
    }
}
