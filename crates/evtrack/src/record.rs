//! Event records
//!
//! One line of a batch's `info` field.

use std::fmt;

use evtrack_net::FIELD_SEPARATOR;

/// A recorded event, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub cursor_id: u32,
    pub timestamp_ms: u64,
    pub x: u32,
    pub y: u32,
    pub event_name: String,
    pub target_path: String,
    /// JSON object of the target's attributes, or `{}`
    pub target_attributes: String,
    /// JSON from the side callback, or `{}`
    pub extra: String,
}

impl EventRecord {
    /// Serialized columns in collector order:
    /// `cursorId timestamp x y event xpath attrs extras`
    pub fn columns(&self) -> [String; 8] {
        [
            self.cursor_id.to_string(),
            self.timestamp_ms.to_string(),
            self.x.to_string(),
            self.y.to_string(),
            self.event_name.clone(),
            self.target_path.clone(),
            self.target_attributes.clone(),
            self.extra.clone(),
        ]
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns().join(FIELD_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_line_format() {
        let record = EventRecord {
            cursor_id: 0,
            timestamp_ms: 1700000000123,
            x: 12,
            y: 34,
            event_name: "click".into(),
            target_path: "/*[@id='go']".into(),
            target_attributes: r#"{"BUTTON":{"id":"go"}}"#.into(),
            extra: "{}".into(),
        };
        
        assert_eq!(
            record.to_string(),
            r#"0 1700000000123 12 34 click /*[@id='go'] {"BUTTON":{"id":"go"}} {}"#
        );
        assert_eq!(record.columns()[4], "click");
    }
}
