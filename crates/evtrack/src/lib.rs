//! evtrack
//!
//! Captures end-user interaction events inside a page, buffers them, and
//! ships them in batches to a collection endpoint.
//!
//! # Example
//! ```rust,ignore
//! use evtrack::{Config, Controller};
//!
//! let config = Config::from_json(r#"{"endpoint": "https://collector.example/save"}"#)?;
//! let mut controller = Controller::new();
//! controller.record(config, &mut host)?;
//!
//! controller.handle_event(&document, &event);
//! controller.tick(&host);
//! controller.unload(&mut host);
//! ```

pub mod config;
pub mod events;
mod record;
mod buffer;
pub mod clock;
pub mod geometry;
mod controller;

pub use config::{Config, ConfigError, EventSelection, SideCallback};
pub use events::{
    CapturedEvent, EventMultiplexer, EventPayload, HostEvent, ListenerHost, Scope, ScrollOffsets,
};
pub use record::EventRecord;
pub use buffer::{SessionBuffer, SharedSession};
pub use clock::{Clock, ManualClock, SystemClock};
pub use geometry::{HostMetrics, Size};
pub use controller::{Controller, ControllerState, FlushHandle, Host, TrackError};

// Re-export sub-crates for advanced usage
pub use evtrack_dom as dom;
pub use evtrack_net as net;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
