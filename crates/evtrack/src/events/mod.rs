//! Event capture
//!
//! The observable event universe, adapters from host event shapes to one
//! canonical shape, and the multiplexer that decides what gets recorded.

pub mod universe;
pub mod input;
mod multiplexer;

pub use universe::{Category, EventKind, Scope};
pub use input::{
    CapturedEvent, DocumentInput, EventPayload, HostEvent, KeyboardInput, PointerInput,
    ScrollOffsets, TouchInput, TouchPoint, WindowInput,
};
pub use multiplexer::{EventMultiplexer, ListenerHost, Subscription};
