//! Controller
//!
//! Owns the configuration and session of one tracked page and drives it
//! through `Idle -> Recording -> (Flushing -> Recording)* -> Unloading ->
//! Terminated`. Each controller is independent; several can coexist.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use evtrack_dom::Document;
use evtrack_net::{
    Action, Batch, HostCapabilities, HttpTransport, NetError, PendingResponse, SendMode,
    SendOutcome, Transport,
};

use crate::buffer::SharedSession;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::events::{EventMultiplexer, HostEvent, ListenerHost};
use crate::geometry::HostMetrics;
use crate::record::EventRecord;

/// The page the controller is attached to
pub trait Host: ListenerHost {
    /// Current page URL
    fn page_url(&self) -> String;
    
    /// Current viewport, document and screen measurements
    fn metrics(&self) -> HostMetrics;
    
    /// Delivery primitives available at unload time
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            beacon: true,
            page_url: Some(self.page_url()),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Recording,
    Flushing,
    Unloading,
    Terminated,
}

/// Controller error
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("Recording has already started")]
    AlreadyRecording,
    
    #[error("Tracker has been unloaded")]
    Terminated,
    
    #[error(transparent)]
    Config(#[from] ConfigError),
    
    #[error("Transport setup failed: {0}")]
    Net(#[from] NetError),
}

type TransportFactory =
    Box<dyn Fn(&Config, &HostCapabilities) -> Result<Arc<dyn Transport>, NetError> + Send + Sync>;

/// An interactive flush in flight
///
/// Resolves to the response body once any session id it carried has been
/// adopted. Dropping the handle detaches the send; it still completes.
pub struct FlushHandle {
    action: Action,
    records: usize,
    task: Option<smol::Task<Result<String, NetError>>>,
}

impl FlushHandle {
    pub fn action(&self) -> Action {
        self.action
    }
    
    /// Number of records in the batch
    pub fn records(&self) -> usize {
        self.records
    }
    
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }
    
    /// Block until the send completes
    pub fn wait(mut self) -> Result<String, NetError> {
        match self.task.take() {
            Some(task) => smol::block_on(task),
            None => Err(NetError::Network("flush already completed".into())),
        }
    }
}

impl Drop for FlushHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.detach();
        }
    }
}

/// Event tracker for one page
pub struct Controller {
    state: ControllerState,
    config: Option<Config>,
    multiplexer: EventMultiplexer,
    session: SharedSession,
    transport: Option<Arc<dyn Transport>>,
    factory: TransportFactory,
    clock: Arc<dyn Clock>,
    next_flush: Option<u64>,
    init_in_flight: Arc<AtomicBool>,
}

impl Controller {
    /// Controller sending over HTTP to the configured endpoint
    pub fn new() -> Self {
        Self::with_factory(Box::new(|config: &Config, caps: &HostCapabilities| {
            let transport = HttpTransport::connect(&config.endpoint, caps)?;
            Ok(Arc::new(transport) as Arc<dyn Transport>)
        }))
    }
    
    /// Controller sending through a given transport, whatever the endpoint
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::with_factory(Box::new(move |_: &Config, _: &HostCapabilities| Ok(Arc::clone(&transport))))
    }
    
    fn with_factory(factory: TransportFactory) -> Self {
        Self {
            state: ControllerState::Idle,
            config: None,
            multiplexer: EventMultiplexer::new(),
            session: SharedSession::new(),
            transport: None,
            factory,
            clock: Arc::new(SystemClock),
            next_flush: None,
            init_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }
    
    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
    
    pub fn state(&self) -> ControllerState {
        self.state
    }
    
    /// Active configuration, once recording
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }
    
    /// Server-assigned session id, once adopted
    pub fn session_id(&self) -> Option<String> {
        self.session.session_id()
    }
    
    /// Records waiting for the next flush
    pub fn pending_records(&self) -> usize {
        self.session.len()
    }
    
    pub fn multiplexer(&self) -> &EventMultiplexer {
        &self.multiplexer
    }
    
    /// Start recording
    ///
    /// Registers listeners and arms the flush timer. The first flush is due
    /// one interval from now.
    pub fn record<H: Host + ?Sized>(&mut self, config: Config, host: &mut H) -> Result<(), TrackError> {
        match self.state {
            ControllerState::Idle => {}
            ControllerState::Unloading | ControllerState::Terminated => return Err(TrackError::Terminated),
            ControllerState::Recording | ControllerState::Flushing => return Err(TrackError::AlreadyRecording),
        }
        config.validate()?;
        
        let transport = (self.factory)(&config, &host.capabilities())?;
        self.multiplexer.configure(&config);
        self.multiplexer.register(host);
        
        self.next_flush = Some(self.clock.now_ms().saturating_add(interval_ms(&config)));
        tracing::info!(
            "evtrack {} recording {} events to {}",
            crate::VERSION,
            self.multiplexer.subscriptions().len(),
            config.endpoint
        );
        
        self.transport = Some(transport);
        self.config = Some(config);
        self.state = ControllerState::Recording;
        Ok(())
    }
    
    /// Feed one host event through the multiplexer
    ///
    /// Returns the number of records buffered. Events are ignored unless
    /// recording.
    pub fn handle_event(&mut self, document: &Document, event: &HostEvent) -> usize {
        if !matches!(self.state, ControllerState::Recording | ControllerState::Flushing) {
            return 0;
        }
        let records = self.multiplexer.handle(document, event, self.clock.now_ms());
        let count = records.len();
        
        let mut session = self.session.lock();
        for record in records {
            tracing::trace!("Recorded {}", record);
            session.append(record);
        }
        count
    }
    
    /// When the flush timer fires next
    pub fn next_flush_due(&self) -> Option<u64> {
        self.next_flush
    }
    
    /// Fire the flush timer if it is due
    pub fn poll<H: Host + ?Sized>(&mut self, host: &H) -> Option<FlushHandle> {
        let due = self.next_flush?;
        if self.clock.now_ms() < due {
            return None;
        }
        self.tick(host)
    }
    
    /// Flush timer tick
    ///
    /// Sends an `init` while no session id is assigned (even when empty,
    /// unless one is already in flight) and an `append` otherwise. Empty
    /// appends are skipped.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &H) -> Option<FlushHandle> {
        if self.state != ControllerState::Recording {
            return None;
        }
        let interval = self.config.as_ref().map(interval_ms)?;
        self.next_flush = Some(self.clock.now_ms().saturating_add(interval));
        
        self.state = ControllerState::Flushing;
        let handle = self.flush(host);
        self.state = ControllerState::Recording;
        handle
    }
    
    fn flush<H: Host + ?Sized>(&self, host: &H) -> Option<FlushHandle> {
        let (config, transport) = (self.config.as_ref()?, self.transport.as_ref()?);
        
        let batch = {
            let mut session = self.session.lock();
            match session.session_id().map(str::to_string) {
                Some(uid) => {
                    let records = session.drain();
                    if records.is_empty() {
                        tracing::trace!("Nothing to append");
                        return None;
                    }
                    Batch::append(&uid, lines(records))
                }
                None => {
                    if self.init_in_flight.swap(true, Ordering::SeqCst) {
                        tracing::trace!("Init in flight, buffering {} records", session.len());
                        return None;
                    }
                    let metrics = host.metrics().page_metrics(&host.page_url());
                    Batch::init(lines(session.drain()), metrics, &config.task_label)
                }
            }
        };
        
        let action = batch.action();
        let records = batch.records().len();
        tracing::debug!("Flushing {} batch with {} records", action.as_str(), records);
        
        let pending = match transport.send(batch, SendMode::Interactive) {
            SendOutcome::Pending(pending) => pending,
            SendOutcome::Dispatched { .. } => PendingResponse::ready(Ok(String::new())),
            SendOutcome::Failed(err) => PendingResponse::ready(Err(err)),
        };
        
        let task = smol::spawn(complete_flush(
            pending,
            action,
            self.session.clone(),
            Arc::clone(&self.init_in_flight),
            config.debug,
        ));
        
        Some(FlushHandle { action, records, task: Some(task) })
    }
    
    /// Page teardown
    ///
    /// Unregisters every listener and sends one final batch in unload mode:
    /// `init` when no session id was assigned, `append` otherwise. An empty
    /// append is skipped. Calling it again does nothing.
    pub fn unload<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<SendOutcome> {
        if self.state == ControllerState::Terminated {
            return None;
        }
        self.state = ControllerState::Unloading;
        self.multiplexer.unregister(host);
        self.next_flush = None;
        
        let outcome = match (&self.config, &self.transport) {
            (Some(config), Some(transport)) => {
                let batch = {
                    let mut session = self.session.lock();
                    let records = session.drain();
                    match session.session_id() {
                        Some(_) if records.is_empty() => None,
                        Some(uid) => Some(Batch::append(uid, lines(records))),
                        None => {
                            let metrics = host.metrics().page_metrics(&host.page_url());
                            Some(Batch::init(lines(records), metrics, &config.task_label))
                        }
                    }
                };
                
                batch.map(|batch| {
                    let action = batch.action();
                    let outcome = transport.send(batch, SendMode::Unload);
                    match &outcome {
                        SendOutcome::Dispatched { strategy } => {
                            tracing::debug!("Final {} batch handed to {}", action.as_str(), strategy);
                        }
                        SendOutcome::Failed(err) if config.debug => {
                            tracing::debug!("Final {} batch dropped: {}", action.as_str(), err);
                        }
                        _ => {}
                    }
                    outcome
                })
            }
            _ => None,
        };
        
        self.state = ControllerState::Terminated;
        outcome
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

fn interval_ms(config: &Config) -> u64 {
    u64::try_from(config.flush_interval().as_millis()).unwrap_or(u64::MAX)
}

fn lines(records: Vec<EventRecord>) -> Vec<String> {
    records.iter().map(ToString::to_string).collect()
}

/// Await an interactive send and apply its result to the session
async fn complete_flush(
    pending: PendingResponse,
    action: Action,
    session: SharedSession,
    init_in_flight: Arc<AtomicBool>,
    debug: bool,
) -> Result<String, NetError> {
    let result = pending.await;
    
    match &result {
        Ok(body) if action == Action::Init => {
            let id = body.trim();
            if id.is_empty() {
                if debug {
                    tracing::debug!("Init response carried no session id");
                }
            } else if session.adopt_session_id(id) {
                tracing::debug!("Session id {} assigned", id);
            }
        }
        Ok(_) => {}
        Err(err) => {
            if debug {
                tracing::debug!("Dropped {} batch: {}", action.as_str(), err);
            }
        }
    }
    
    if action == Action::Init {
        init_in_flight.store(false, Ordering::SeqCst);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Scope;
    use std::sync::Mutex;
    
    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(Batch, SendMode)>>,
    }
    
    impl Transport for FakeTransport {
        fn send(&self, batch: Batch, mode: SendMode) -> SendOutcome {
            self.sent.lock().unwrap().push((batch, mode));
            match mode {
                SendMode::Interactive => SendOutcome::Pending(PendingResponse::ready(Ok("7".into()))),
                SendMode::Unload => SendOutcome::Dispatched { strategy: "fake" },
            }
        }
    }
    
    #[derive(Default)]
    struct FakeHost {
        listeners: usize,
    }
    
    impl ListenerHost for FakeHost {
        fn add_listener(&mut self, _scope: Scope, _event: &str) {
            self.listeners += 1;
        }
        
        fn remove_listener(&mut self, _scope: Scope, _event: &str) {
            self.listeners -= 1;
        }
    }
    
    impl Host for FakeHost {
        fn page_url(&self) -> String {
            "http://page.test/".into()
        }
        
        fn metrics(&self) -> HostMetrics {
            HostMetrics::default()
        }
    }
    
    #[test]
    fn test_state_machine() {
        let transport = Arc::new(FakeTransport::default());
        let mut controller = Controller::with_transport(transport.clone());
        let mut host = FakeHost::default();
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(controller.tick(&host).is_none());
        
        controller.record(Config::default(), &mut host).unwrap();
        assert_eq!(controller.state(), ControllerState::Recording);
        assert!(host.listeners > 0);
        
        controller.tick(&host).unwrap().wait().unwrap();
        assert_eq!(controller.state(), ControllerState::Recording);
        assert_eq!(controller.session_id().as_deref(), Some("7"));
        
        controller.unload(&mut host);
        assert_eq!(controller.state(), ControllerState::Terminated);
        assert_eq!(host.listeners, 0);
        assert!(controller.unload(&mut host).is_none());
    }
    
    #[test]
    fn test_second_record_rejected() {
        let mut controller = Controller::with_transport(Arc::new(FakeTransport::default()));
        let mut host = FakeHost::default();
        
        let first = Config { task_label: "first".into(), ..Default::default() };
        controller.record(first, &mut host).unwrap();
        let listeners = host.listeners;
        
        let second = Config { task_label: "second".into(), ..Default::default() };
        assert!(matches!(controller.record(second, &mut host), Err(TrackError::AlreadyRecording)));
        assert_eq!(controller.config().unwrap().task_label, "first");
        assert_eq!(host.listeners, listeners);
    }
    
    #[test]
    fn test_invalid_config_rejected() {
        let mut controller = Controller::with_transport(Arc::new(FakeTransport::default()));
        let mut host = FakeHost::default();
        
        let config = Config { flush_interval_seconds: 0, ..Default::default() };
        assert!(matches!(controller.record(config, &mut host), Err(TrackError::Config(_))));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(host.listeners, 0);
    }
    
    #[test]
    fn test_unload_when_idle_sends_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let mut controller = Controller::with_transport(transport.clone());
        let mut host = FakeHost::default();
        
        assert!(controller.unload(&mut host).is_none());
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(matches!(controller.record(Config::default(), &mut host), Err(TrackError::Terminated)));
    }
    
    #[test]
    fn test_flush_schedule() {
        let clock = crate::clock::ManualClock::new(10_000);
        let mut controller = Controller::with_transport(Arc::new(FakeTransport::default()))
            .with_clock(Arc::new(clock.clone()));
        let mut host = FakeHost::default();
        
        controller.record(Config { flush_interval_seconds: 2, ..Default::default() }, &mut host).unwrap();
        assert_eq!(controller.next_flush_due(), Some(12_000));
        
        clock.advance(1_999);
        assert!(controller.poll(&host).is_none());
        
        clock.advance(1);
        let handle = controller.poll(&host).unwrap();
        assert_eq!(handle.action(), Action::Init);
        assert_eq!(controller.next_flush_due(), Some(14_000));
    }
}
