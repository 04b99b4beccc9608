//! Host event shapes and their adapters
//!
//! Hosts deliver events in category-specific shapes. Each category has one
//! adapter producing [`CapturedEvent`]s; nothing past this module looks at
//! the host shape.

use evtrack_dom::NodeId;

/// Scroll offsets of the body and root element when the event fired
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffsets {
    pub body_left: f64,
    pub body_top: f64,
    pub root_left: f64,
    pub root_top: f64,
}

impl ScrollOffsets {
    fn left(&self) -> f64 {
        self.body_left + self.root_left
    }
    
    fn top(&self) -> f64 {
        self.body_top + self.root_top
    }
}

/// Mouse, wheel and click events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerInput {
    pub page_x: Option<f64>,
    pub page_y: Option<f64>,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
    pub button: Option<u16>,
}

impl PointerInput {
    /// Pointer at page coordinates
    pub fn at_page(x: f64, y: f64) -> Self {
        Self { page_x: Some(x), page_y: Some(y), ..Default::default() }
    }
    
    /// Pointer at viewport coordinates
    pub fn at_client(x: f64, y: f64) -> Self {
        Self { client_x: Some(x), client_y: Some(y), ..Default::default() }
    }
}

/// One changed touch point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchPoint {
    /// Host-provided touch identifier
    pub identifier: Option<u32>,
    /// Element under this point, if it differs from the event target
    pub target: Option<NodeId>,
    pub page_x: Option<f64>,
    pub page_y: Option<f64>,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
}

/// Touch gesture with its changed points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchInput {
    pub changed_touches: Vec<TouchPoint>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardInput {
    pub key: Option<String>,
    pub code: Option<String>,
}

/// Clipboard, form and scroll events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInput {
    /// Clipboard text or field value, when the host exposes it
    pub data: Option<String>,
}

/// Window-scoped events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowInput {
    /// Hash, storage key or message origin, when relevant
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Pointer(PointerInput),
    Touch(TouchInput),
    Keyboard(KeyboardInput),
    Document(DocumentInput),
    Window(WindowInput),
}

/// An event as delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    /// Event type, e.g. `click`
    pub name: String,
    /// Target node; `None` for window targets
    pub target: Option<NodeId>,
    /// Dispatched by the user agent rather than by script
    pub trusted: bool,
    pub scroll: ScrollOffsets,
    pub payload: EventPayload,
}

impl HostEvent {
    fn new(name: &str, target: Option<NodeId>, payload: EventPayload) -> Self {
        Self {
            name: name.to_string(),
            target,
            trusted: true,
            scroll: ScrollOffsets::default(),
            payload,
        }
    }
    
    pub fn pointer(name: &str, target: NodeId, input: PointerInput) -> Self {
        Self::new(name, Some(target), EventPayload::Pointer(input))
    }
    
    pub fn touch(name: &str, target: NodeId, input: TouchInput) -> Self {
        Self::new(name, Some(target), EventPayload::Touch(input))
    }
    
    pub fn keyboard(name: &str, target: NodeId, input: KeyboardInput) -> Self {
        Self::new(name, Some(target), EventPayload::Keyboard(input))
    }
    
    pub fn document(name: &str, target: NodeId, input: DocumentInput) -> Self {
        Self::new(name, Some(target), EventPayload::Document(input))
    }
    
    pub fn window(name: &str, input: WindowInput) -> Self {
        Self::new(name, None, EventPayload::Window(input))
    }
    
    /// Mark as script-dispatched
    pub fn untrusted(mut self) -> Self {
        self.trusted = false;
        self
    }
    
    pub fn with_scroll(mut self, scroll: ScrollOffsets) -> Self {
        self.scroll = scroll;
        self
    }
}

/// Canonical input to record construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub cursor_id: u32,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub target: Option<NodeId>,
}

/// Cursor position in page coordinates
///
/// Page coordinates win when either is non-zero; otherwise client
/// coordinates are offset by the scroll position. Missing, negative and
/// non-finite values become 0.
pub fn cursor_position(
    page: (Option<f64>, Option<f64>),
    client: (Option<f64>, Option<f64>),
    scroll: &ScrollOffsets,
) -> (u32, u32) {
    let set = |v: Option<f64>| v.is_some_and(|v| v != 0.0 && !v.is_nan());
    
    let (x, y) = if set(page.0) || set(page.1) {
        (page.0.unwrap_or(0.0), page.1.unwrap_or(0.0))
    } else if set(client.0) || set(client.1) {
        (client.0.unwrap_or(0.0) + scroll.left(), client.1.unwrap_or(0.0) + scroll.top())
    } else {
        (0.0, 0.0)
    };
    
    (clamp(x), clamp(y))
}

fn clamp(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

pub fn adapt_pointer(event: &HostEvent, input: &PointerInput) -> CapturedEvent {
    let (x, y) = cursor_position(
        (input.page_x, input.page_y),
        (input.client_x, input.client_y),
        &event.scroll,
    );
    CapturedEvent { cursor_id: 0, name: event.name.clone(), x, y, target: event.target }
}

/// One record per changed touch point, named after the gesture
pub fn adapt_touch(event: &HostEvent, input: &TouchInput) -> Vec<CapturedEvent> {
    input.changed_touches.iter()
        .map(|touch| {
            let (x, y) = cursor_position(
                (touch.page_x, touch.page_y),
                (touch.client_x, touch.client_y),
                &event.scroll,
            );
            CapturedEvent {
                cursor_id: touch.identifier.unwrap_or(0),
                name: event.name.clone(),
                x,
                y,
                target: touch.target.or(event.target),
            }
        })
        .collect()
}

pub fn adapt_keyboard(event: &HostEvent, _input: &KeyboardInput) -> CapturedEvent {
    at_origin(event, event.target)
}

pub fn adapt_document(event: &HostEvent, _input: &DocumentInput) -> CapturedEvent {
    at_origin(event, event.target)
}

pub fn adapt_window(event: &HostEvent, _input: &WindowInput) -> CapturedEvent {
    at_origin(event, None)
}

fn at_origin(event: &HostEvent, target: Option<NodeId>) -> CapturedEvent {
    CapturedEvent { cursor_id: 0, name: event.name.clone(), x: 0, y: 0, target }
}

/// Run the adapter for the event's payload
pub fn adapt(event: &HostEvent) -> Vec<CapturedEvent> {
    match &event.payload {
        EventPayload::Pointer(input) => vec![adapt_pointer(event, input)],
        EventPayload::Touch(input) => adapt_touch(event, input),
        EventPayload::Keyboard(input) => vec![adapt_keyboard(event, input)],
        EventPayload::Document(input) => vec![adapt_document(event, input)],
        EventPayload::Window(input) => vec![adapt_window(event, input)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_cursor_prefers_page_coordinates() {
        let scroll = ScrollOffsets { body_top: 100.0, ..Default::default() };
        assert_eq!(cursor_position((Some(10.4), Some(20.6)), (Some(1.0), Some(2.0)), &scroll), (10, 21));
        // Only one page axis set still wins
        assert_eq!(cursor_position((Some(0.0), Some(5.0)), (Some(1.0), Some(2.0)), &scroll), (0, 5));
    }
    
    #[test]
    fn test_cursor_falls_back_to_client_plus_scroll() {
        let scroll = ScrollOffsets { body_left: 3.0, body_top: 10.0, root_left: 4.0, root_top: 20.0 };
        assert_eq!(cursor_position((None, Some(0.0)), (Some(5.0), Some(6.0)), &scroll), (12, 36));
    }
    
    #[test]
    fn test_cursor_clamps() {
        let scroll = ScrollOffsets::default();
        assert_eq!(cursor_position((Some(-4.0), Some(7.0)), (None, None), &scroll), (0, 7));
        assert_eq!(cursor_position((None, None), (None, None), &scroll), (0, 0));
        assert_eq!(cursor_position((Some(f64::NAN), Some(f64::NAN)), (Some(-1.0), Some(-2.0)), &scroll), (0, 0));
    }
    
    #[test]
    fn test_touch_fan_out() {
        let target = NodeId::ROOT;
        let input = TouchInput {
            changed_touches: vec![
                TouchPoint { identifier: Some(3), page_x: Some(1.0), page_y: Some(2.0), ..Default::default() },
                TouchPoint { identifier: None, page_x: Some(5.0), page_y: Some(6.0), ..Default::default() },
            ],
        };
        let captured = adapt(&HostEvent::touch("touchstart", target, input));
        
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].cursor_id, 3);
        assert_eq!(captured[1].cursor_id, 0);
        assert!(captured.iter().all(|c| c.name == "touchstart"));
        assert_eq!((captured[1].x, captured[1].y), (5, 6));
        assert_eq!(captured[0].target, Some(target));
    }
    
    #[test]
    fn test_touch_without_points() {
        let event = HostEvent::touch("touchend", NodeId::ROOT, TouchInput::default());
        assert!(adapt(&event).is_empty());
    }
    
    #[test]
    fn test_keyboard_and_window_at_origin() {
        let key = adapt(&HostEvent::keyboard("keydown", NodeId::ROOT, KeyboardInput::default()));
        assert_eq!((key[0].x, key[0].y), (0, 0));
        assert_eq!(key[0].target, Some(NodeId::ROOT));
        
        let resize = adapt(&HostEvent::window("resize", WindowInput::default()));
        assert_eq!(resize[0].target, None);
        assert_eq!(resize[0].name, "resize");
    }
}
