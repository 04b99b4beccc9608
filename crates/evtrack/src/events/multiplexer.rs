//! Event multiplexer
//!
//! Decides which events are subscribed, registers one listener per concrete
//! event name, and turns host events into records. Polling-governed events
//! share one sampling clock across all names.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use evtrack_dom::{serialize_attrs, xpath, Document, NodeId};

use crate::config::{Config, SideCallback};
use crate::events::input::{self, CapturedEvent, HostEvent};
use crate::events::universe::{self, EventKind, Scope};
use crate::record::EventRecord;

/// Where listeners get attached
pub trait ListenerHost {
    fn add_listener(&mut self, scope: Scope, event: &str);
    fn remove_listener(&mut self, scope: Scope, event: &str);
}

/// A subscribed event and how it is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: EventKind,
    /// Subject to sampling
    pub polled: bool,
}

/// Turns host events into event records
#[derive(Default)]
pub struct EventMultiplexer {
    subscriptions: Vec<Subscription>,
    registered: bool,
    polling_interval: Duration,
    capture_attributes: bool,
    side_callback: Option<SideCallback>,
    debug: bool,
    /// Timestamp of the last polled record, across all polled names
    last_polled: Option<u64>,
}

impl EventMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Compute the subscription set from a configuration
    ///
    /// A name selected by both sets is polled only.
    pub fn configure(&mut self, config: &Config) {
        let mut subscriptions: Vec<Subscription> = universe::expand(&config.regular_events)
            .into_iter()
            .map(|kind| Subscription { kind, polled: false })
            .collect();
        
        for kind in universe::expand(&config.polling_events) {
            match subscriptions.iter_mut().find(|s| s.kind.name == kind.name) {
                Some(existing) => existing.polled = true,
                None => subscriptions.push(Subscription { kind, polled: true }),
            }
        }
        
        self.subscriptions = subscriptions;
        self.polling_interval = config.polling_interval();
        self.capture_attributes = config.capture_attributes;
        self.side_callback = config.side_callback.clone();
        self.debug = config.debug;
        self.last_polled = None;
        
        tracing::debug!(
            "Multiplexer configured: {} events ({} polled)",
            self.subscriptions.len(),
            self.subscriptions.iter().filter(|s| s.polled).count()
        );
    }
    
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }
    
    pub fn subscription(&self, name: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.kind.name == name)
    }
    
    pub fn is_polled(&self, name: &str) -> bool {
        self.subscription(name).is_some_and(|s| s.polled)
    }
    
    pub fn is_registered(&self) -> bool {
        self.registered
    }
    
    /// Attach exactly one listener per subscribed event
    pub fn register<H: ListenerHost + ?Sized>(&mut self, host: &mut H) {
        if self.registered {
            return;
        }
        for sub in &self.subscriptions {
            host.add_listener(sub.kind.scope, sub.kind.name);
        }
        self.registered = true;
    }
    
    /// Detach every listener; a no-op when nothing is registered
    pub fn unregister<H: ListenerHost + ?Sized>(&mut self, host: &mut H) {
        if !self.registered {
            return;
        }
        for sub in &self.subscriptions {
            host.remove_listener(sub.kind.scope, sub.kind.name);
        }
        self.registered = false;
    }
    
    /// Records produced by one host event
    ///
    /// Untrusted and unsubscribed events produce nothing, as do events whose
    /// payload does not match their category. Touch gestures
    /// produce one record per changed point, each sampled on its own.
    pub fn handle(&mut self, document: &Document, event: &HostEvent, now: u64) -> Vec<EventRecord> {
        if !event.trusted {
            tracing::trace!("Dropping untrusted {} event", event.name);
            return Vec::new();
        }
        let Some(&Subscription { kind, polled }) = self.subscription(&event.name) else {
            return Vec::new();
        };
        if !kind.category.accepts(&event.payload) {
            tracing::trace!("Dropping {} event: payload does not match {:?}", event.name, kind.category);
            return Vec::new();
        }
        
        let mut extra: Option<String> = None;
        let mut records = Vec::new();
        for captured in input::adapt(event) {
            if polled && !self.sample(now) {
                continue;
            }
            let extra = extra.get_or_insert_with(|| self.extra(event)).clone();
            records.push(self.build_record(document, captured, now, extra));
        }
        records
    }
    
    /// Apply the polling clock, advancing it when the firing is kept
    fn sample(&mut self, now: u64) -> bool {
        if !self.polling_interval.is_zero() {
            if let Some(last) = self.last_polled {
                if Duration::from_millis(now.saturating_sub(last)) < self.polling_interval {
                    return false;
                }
            }
        }
        self.last_polled = Some(now);
        true
    }
    
    /// Side callback output, or `{}` when there is none or it panics
    fn extra(&self, event: &HostEvent) -> String {
        let Some(callback) = &self.side_callback else {
            return "{}".to_string();
        };
        match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
            Ok(value) => value.to_string(),
            Err(_) => {
                if self.debug {
                    tracing::debug!("Side callback for {} panicked, extra left empty", event.name);
                }
                "{}".to_string()
            }
        }
    }
    
    fn build_record(&self, document: &Document, captured: CapturedEvent, now: u64, extra: String) -> EventRecord {
        let target = captured.target.map(|node| element_target(document, node));
        
        let target_path = match target {
            Some(node) => xpath::resolve(document, node, false).to_string(),
            None => "/".to_string(),
        };
        if self.debug && target_path == "/" && target.is_some() {
            tracing::debug!("Target of {} is not attached to the document", captured.name);
        }
        
        let target_attributes = match target {
            Some(node) if self.capture_attributes => serialize_attrs(document, node),
            _ => "{}".to_string(),
        };
        
        EventRecord {
            cursor_id: captured.cursor_id,
            timestamp_ms: now,
            x: captured.x,
            y: captured.y,
            event_name: captured.name,
            target_path,
            target_attributes,
            extra,
        }
    }
}

/// Text-node targets are reported as their parent element
fn element_target(document: &Document, node: NodeId) -> NodeId {
    let tree = document.tree();
    match tree.get(node) {
        Some(n) if n.is_text() => tree.parent(node).unwrap_or(node),
        _ => node,
    }
}
