//! Observable events
//!
//! Two universes: events listened for on the document and events listened
//! for on the window. Teardown events (`unload`, `beforeunload`) belong to
//! the controller and are not part of either.

use crate::config::EventSelection;
use crate::events::input::EventPayload;

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Document,
    Window,
}

/// Event category, fixes the payload shape a host delivers for the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pointer,
    Touch,
    Keyboard,
    Clipboard,
    Form,
    Scroll,
    Focus,
    Resize,
    Lifecycle,
    Connectivity,
    Storage,
    Messaging,
}

impl Category {
    /// Whether `payload` has the shape this category is captured from
    pub fn accepts(self, payload: &EventPayload) -> bool {
        match self {
            Self::Pointer => matches!(payload, EventPayload::Pointer(_)),
            Self::Touch => matches!(payload, EventPayload::Touch(_)),
            Self::Keyboard => matches!(payload, EventPayload::Keyboard(_)),
            Self::Clipboard | Self::Form | Self::Scroll => matches!(payload, EventPayload::Document(_)),
            Self::Focus | Self::Resize | Self::Lifecycle | Self::Connectivity | Self::Storage | Self::Messaging => {
                matches!(payload, EventPayload::Window(_))
            }
        }
    }
}

/// One observable event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKind {
    pub name: &'static str,
    pub scope: Scope,
    pub category: Category,
}

const DOCUMENT_EVENTS: &[(&str, Category)] = &[
    ("mousedown", Category::Pointer),
    ("mouseup", Category::Pointer),
    ("mousemove", Category::Pointer),
    ("mouseover", Category::Pointer),
    ("mouseout", Category::Pointer),
    ("mousewheel", Category::Pointer),
    ("wheel", Category::Pointer),
    ("click", Category::Pointer),
    ("dblclick", Category::Pointer),
    ("contextmenu", Category::Pointer),
    ("touchstart", Category::Touch),
    ("touchend", Category::Touch),
    ("touchmove", Category::Touch),
    ("touchcancel", Category::Touch),
    ("keydown", Category::Keyboard),
    ("keyup", Category::Keyboard),
    ("keypress", Category::Keyboard),
    ("copy", Category::Clipboard),
    ("cut", Category::Clipboard),
    ("paste", Category::Clipboard),
    ("input", Category::Form),
    ("change", Category::Form),
    ("select", Category::Form),
    ("submit", Category::Form),
    ("reset", Category::Form),
    ("focusin", Category::Form),
    ("focusout", Category::Form),
    ("scroll", Category::Scroll),
];

const WINDOW_EVENTS: &[(&str, Category)] = &[
    ("focus", Category::Focus),
    ("blur", Category::Focus),
    ("resize", Category::Resize),
    ("load", Category::Lifecycle),
    ("pageshow", Category::Lifecycle),
    ("pagehide", Category::Lifecycle),
    ("hashchange", Category::Lifecycle),
    ("popstate", Category::Lifecycle),
    ("online", Category::Connectivity),
    ("offline", Category::Connectivity),
    ("storage", Category::Storage),
    ("message", Category::Messaging),
];

fn kinds(table: &'static [(&'static str, Category)], scope: Scope) -> impl Iterator<Item = EventKind> {
    table.iter().map(move |&(name, category)| EventKind { name, scope, category })
}

/// Every document-scoped event
pub fn document_events() -> impl Iterator<Item = EventKind> {
    kinds(DOCUMENT_EVENTS, Scope::Document)
}

/// Every window-scoped event
pub fn window_events() -> impl Iterator<Item = EventKind> {
    kinds(WINDOW_EVENTS, Scope::Window)
}

/// Both universes, document first
pub fn all_events() -> impl Iterator<Item = EventKind> {
    document_events().chain(window_events())
}

/// Look up an event by name
pub fn lookup(name: &str) -> Option<EventKind> {
    all_events().find(|kind| kind.name == name)
}

/// Concrete events named by a selection
///
/// Unknown names key into nothing and are dropped.
pub fn expand(selection: &EventSelection) -> Vec<EventKind> {
    match selection {
        EventSelection::All => all_events().collect(),
        EventSelection::Names(names) => names.iter()
            .filter_map(|name| {
                let kind = lookup(name);
                if kind.is_none() {
                    tracing::trace!("Ignoring unknown event name {:?}", name);
                }
                kind
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_lookup() {
        let click = lookup("click").unwrap();
        assert_eq!(click.scope, Scope::Document);
        assert_eq!(click.category, Category::Pointer);
        
        let resize = lookup("resize").unwrap();
        assert_eq!(resize.scope, Scope::Window);
        
        assert_eq!(lookup("scroll").unwrap().scope, Scope::Document);
        assert!(lookup("unload").is_none());
        assert!(lookup("beforeunload").is_none());
    }
    
    #[test]
    fn test_category_accepts_matching_payload() {
        use crate::events::input::{DocumentInput, PointerInput, WindowInput};
        
        let pointer = EventPayload::Pointer(PointerInput::default());
        let document = EventPayload::Document(DocumentInput::default());
        let window = EventPayload::Window(WindowInput::default());
        
        assert!(Category::Pointer.accepts(&pointer));
        assert!(!Category::Pointer.accepts(&window));
        assert!(Category::Scroll.accepts(&document));
        assert!(Category::Form.accepts(&document));
        assert!(Category::Storage.accepts(&window));
        assert!(!Category::Focus.accepts(&document));
    }
    
    #[test]
    fn test_expand_all() {
        let all = expand(&EventSelection::All);
        assert_eq!(all.len(), DOCUMENT_EVENTS.len() + WINDOW_EVENTS.len());
        assert_eq!(all[0].name, "mousedown");
        assert!(all.iter().any(|s| s.name == "message" && s.scope == Scope::Window));
    }
    
    #[test]
    fn test_expand_drops_unknown() {
        let kinds = expand(&EventSelection::parse("click bogus keyup"));
        let names: Vec<_> = kinds.iter().map(|s| s.name).collect();
        assert_eq!(names, ["click", "keyup"]);
    }
    
    #[test]
    fn test_names_unique_across_universes() {
        let mut names: Vec<_> = all_events().map(|s| s.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
