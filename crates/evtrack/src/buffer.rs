//! Session buffer
//!
//! Ordered pending records plus the session id lifecycle
//! (anonymous, then assigned exactly once).

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::record::EventRecord;

/// Pending records and the session id
#[derive(Debug, Default)]
pub struct SessionBuffer {
    id: Option<String>,
    pending: Vec<EventRecord>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Queue a record; arrival order is kept
    pub fn append(&mut self, record: EventRecord) {
        self.pending.push(record);
    }
    
    /// Take every pending record, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<EventRecord> {
        mem::take(&mut self.pending)
    }
    
    /// Adopt a server-assigned id; ignored once an id is set
    ///
    /// Returns whether the id was adopted.
    pub fn adopt_session_id(&mut self, id: &str) -> bool {
        if self.id.is_some() {
            return false;
        }
        self.id = Some(id.to_string());
        true
    }
    
    pub fn session_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    
    pub fn len(&self) -> usize {
        self.pending.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Session buffer shared between the controller and in-flight sends
///
/// Drain and adopt each run under one lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct SharedSession(Arc<Mutex<SessionBuffer>>);

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Lock the buffer; a poisoned lock is recovered
    pub fn lock(&self) -> MutexGuard<'_, SessionBuffer> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    
    pub fn append(&self, record: EventRecord) {
        self.lock().append(record);
    }
    
    pub fn drain(&self) -> Vec<EventRecord> {
        self.lock().drain()
    }
    
    pub fn adopt_session_id(&self, id: &str) -> bool {
        self.lock().adopt_session_id(id)
    }
    
    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id().map(str::to_string)
    }
    
    pub fn len(&self) -> usize {
        self.lock().len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
