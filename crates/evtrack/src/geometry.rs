//! Page geometry
//!
//! Hosts expose viewport and document measurements unevenly. The fallback
//! chains below pick the first usable value; zero counts as unusable.

use evtrack_net::PageMetrics;

/// Width and height in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Raw measurements as exposed by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMetrics {
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    /// Window inner size
    pub inner_width: Option<u32>,
    pub inner_height: Option<u32>,
    /// Maximum scroll offsets of the window
    pub scroll_max_x: Option<u32>,
    pub scroll_max_y: Option<u32>,
    /// Root element client size
    pub root_client_width: Option<u32>,
    pub root_client_height: Option<u32>,
    pub body_client_width: Option<u32>,
    pub body_client_height: Option<u32>,
    pub body_scroll_width: Option<u32>,
    pub body_scroll_height: Option<u32>,
    pub body_offset_width: Option<u32>,
    pub body_offset_height: Option<u32>,
}

fn usable(value: Option<u32>) -> Option<u32> {
    value.filter(|&v| v > 0)
}

/// `inner + scroll_max`, then body scroll size when it exceeds the offset
/// size, then body offset size
fn document_extent(inner: Option<u32>, scroll_max: Option<u32>, scroll: Option<u32>, offset: Option<u32>) -> u32 {
    if let (Some(inner), Some(max)) = (usable(inner), usable(scroll_max)) {
        return inner.saturating_add(max);
    }
    match (scroll, offset) {
        (Some(scroll), Some(offset)) if scroll > offset => scroll,
        _ => usable(offset).unwrap_or(0),
    }
}

impl HostMetrics {
    /// Viewport size
    pub fn window_size(&self) -> Size {
        Size {
            width: usable(self.inner_width)
                .or(usable(self.root_client_width))
                .or(usable(self.body_client_width))
                .unwrap_or(0),
            height: usable(self.inner_height)
                .or(usable(self.root_client_height))
                .or(usable(self.body_client_height))
                .unwrap_or(0),
        }
    }
    
    /// Full document size
    pub fn document_size(&self) -> Size {
        Size {
            width: document_extent(self.inner_width, self.scroll_max_x, self.body_scroll_width, self.body_offset_width),
            height: document_extent(self.inner_height, self.scroll_max_y, self.body_scroll_height, self.body_offset_height),
        }
    }
    
    /// Metadata carried by `init` batches
    pub fn page_metrics(&self, url: &str) -> PageMetrics {
        let win = self.window_size();
        let doc = self.document_size();
        PageMetrics {
            url: url.to_string(),
            screen_width: self.screen_width.unwrap_or(0),
            screen_height: self.screen_height.unwrap_or(0),
            window_width: win.width,
            window_height: win.height,
            document_width: doc.width,
            document_height: doc.height,
        }
    }
}
