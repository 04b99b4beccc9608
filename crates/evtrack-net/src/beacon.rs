//! Beacon API
//!
//! Send analytics data without blocking: the POST is queued on smol's
//! blocking pool and nobody waits for the answer.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{PostRequest, RequestSender};

/// Largest payload a beacon accepts
pub const BEACON_QUOTA: usize = 64 * 1024;

/// Send a beacon (fire-and-forget HTTP POST)
///
/// Returns true if the beacon was queued.
pub fn send_beacon(
    sender: Arc<dyn RequestSender>,
    url: &str,
    data: BeaconData,
    timeout: Duration,
) -> bool {
    if url.is_empty() || !data.is_valid() {
        return false;
    }
    let body = data.body();
    if body.len() > BEACON_QUOTA {
        tracing::debug!("Beacon payload of {} bytes exceeds quota", body.len());
        return false;
    }
    
    let request = PostRequest::new(url, body, timeout)
        .with_header("Content-Type", data.content_type());
    
    smol::unblock(move || {
        if let Err(err) = sender.post(&request) {
            tracing::debug!("Beacon to {} failed: {}", request.url, err);
        }
    })
    .detach();
    
    true
}

/// Beacon data types
#[derive(Debug, Clone)]
pub enum BeaconData {
    Text(String),
    Blob { data: Vec<u8>, mime_type: String },
    UrlSearchParams(String),
}

impl BeaconData {
    /// Check if data is valid for sending
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Blob { data, .. } => !data.is_empty(),
            Self::UrlSearchParams(s) => !s.is_empty(),
        }
    }
    
    /// Get content type
    pub fn content_type(&self) -> &str {
        match self {
            Self::Text(_) => "text/plain;charset=UTF-8",
            Self::Blob { mime_type, .. } => mime_type,
            Self::UrlSearchParams(_) => "application/x-www-form-urlencoded;charset=UTF-8",
        }
    }
    
    /// Get body bytes
    pub fn body(&self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.as_bytes().to_vec(),
            Self::Blob { data, .. } => data.clone(),
            Self::UrlSearchParams(s) => s.as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetError, Response};
    use std::sync::Mutex;
    use std::sync::mpsc;
    
    struct ChannelSender(Mutex<mpsc::Sender<PostRequest>>);
    
    impl RequestSender for ChannelSender {
        fn post(&self, request: &PostRequest) -> Result<Response, NetError> {
            let _ = self.0.lock().unwrap().send(request.clone());
            Ok(Response { status: 204, headers: vec![], body: vec![] })
        }
    }
    
    #[test]
    fn test_beacon_data_text() {
        let data = BeaconData::Text("analytics".into());
        
        assert!(data.is_valid());
        assert_eq!(data.content_type(), "text/plain;charset=UTF-8");
        assert!(!BeaconData::UrlSearchParams(String::new()).is_valid());
    }
    
    #[test]
    fn test_send_beacon_queues_post() {
        let (tx, rx) = mpsc::channel();
        let sender = Arc::new(ChannelSender(Mutex::new(tx)));
        
        let queued = send_beacon(sender, "https://example.com/save", BeaconData::Text("x".into()), Duration::from_secs(1));
        assert!(queued);
        
        let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(request.body, b"x");
        assert_eq!(request.header("Content-Type"), Some("text/plain;charset=UTF-8"));
    }
    
    #[test]
    fn test_send_beacon_rejects() {
        let (tx, _rx) = mpsc::channel();
        let sender: Arc<dyn RequestSender> = Arc::new(ChannelSender(Mutex::new(tx)));
        
        assert!(!send_beacon(sender.clone(), "", BeaconData::Text("x".into()), Duration::from_secs(1)));
        let oversized = BeaconData::Text("x".repeat(BEACON_QUOTA + 1));
        assert!(!send_beacon(sender, "https://example.com/save", oversized, Duration::from_secs(1)));
    }
}
