//! Tracker Configuration
//!
//! Deserialized from JSON with camelCase keys. Every key is optional and
//! unknown keys are ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::events::HostEvent;

/// Produces the `extra` column of a record from the raw host event
///
/// Runs inside the capture path. A panic is caught and leaves `extra` as `{}`.
pub type SideCallback = Arc<dyn Fn(&HostEvent) -> serde_json::Value + Send + Sync>;

/// A set of event names, or every event of the universe
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSelection")]
pub enum EventSelection {
    /// `"*"`
    #[default]
    All,
    /// Explicit event names
    Names(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Text(String),
    List(Vec<String>),
}

impl From<RawSelection> for EventSelection {
    fn from(raw: RawSelection) -> Self {
        match raw {
            RawSelection::Text(text) => Self::parse(&text),
            RawSelection::List(items) => Self::from_names(items.iter().map(String::as_str)),
        }
    }
}

impl EventSelection {
    /// Parse a whitespace or comma separated list
    pub fn parse(text: &str) -> Self {
        Self::from_names(text.split(|c: char| c.is_whitespace() || c == ','))
    }
    
    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut out: Vec<String> = Vec::new();
        for name in names.map(str::trim).filter(|n| !n.is_empty()) {
            if name == "*" {
                return Self::All;
            }
            if !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        Self::Names(out)
    }
    
    /// Nothing selected
    pub fn none() -> Self {
        Self::Names(Vec::new())
    }
    
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
    
    /// Explicit names; empty for `All`
    pub fn names(&self) -> &[String] {
        match self {
            Self::All => &[],
            Self::Names(names) => names,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    
    #[error("Flush interval must be greater than zero")]
    ZeroFlushInterval,
}

/// Tracker configuration
///
/// Immutable once handed to [`Controller::record`](crate::Controller::record).
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Collection endpoint
    #[serde(alias = "postServer")]
    pub endpoint: String,
    
    /// Seconds between flushes
    #[serde(alias = "postInterval")]
    pub flush_interval_seconds: u64,
    
    /// Events recorded on every firing
    pub regular_events: EventSelection,
    
    /// Events subject to sampling; these win over `regular_events`
    pub polling_events: EventSelection,
    
    /// Minimum gap between two polled records, 0 records everything
    #[serde(alias = "pollingMs")]
    pub polling_interval_ms: u64,
    
    /// Identifies the tracking task on the collector side
    #[serde(alias = "taskName")]
    pub task_label: String,
    
    /// Serialize the target's attributes into each record
    pub capture_attributes: bool,
    
    /// Log swallowed faults
    pub debug: bool,
    
    #[serde(skip)]
    pub side_callback: Option<SideCallback>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/save".to_string(),
            flush_interval_seconds: 30,
            regular_events: EventSelection::All,
            polling_events: EventSelection::parse("mousemove touchmove scroll resize"),
            polling_interval_ms: 150,
            task_label: "evtrack".to_string(),
            capture_attributes: true,
            debug: false,
            side_callback: None,
        }
    }
}

impl Config {
    /// Parse from JSON; `null` values keep their default
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.retain(|_, v| !v.is_null());
        }
        let config: Config = serde_json::from_value(value)?;
        Ok(config)
    }
    
    /// Attach a side callback
    pub fn with_side_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HostEvent) -> serde_json::Value + Send + Sync + 'static,
    {
        self.side_callback = Some(Arc::new(callback));
        self
    }
    
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_seconds == 0 {
            return Err(ConfigError::ZeroFlushInterval);
        }
        Ok(())
    }
    
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_seconds)
    }
    
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("flush_interval_seconds", &self.flush_interval_seconds)
            .field("regular_events", &self.regular_events)
            .field("polling_events", &self.polling_events)
            .field("polling_interval_ms", &self.polling_interval_ms)
            .field("task_label", &self.task_label)
            .field("capture_attributes", &self.capture_attributes)
            .field("debug", &self.debug)
            .field("side_callback", &self.side_callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.endpoint, "http://localhost/save");
        assert_eq!(config.flush_interval_seconds, 30);
        assert!(config.regular_events.is_all());
        assert_eq!(config.polling_events.names(), ["mousemove", "touchmove", "scroll", "resize"]);
        assert_eq!(config.polling_interval_ms, 150);
        assert_eq!(config.task_label, "evtrack");
        assert!(config.capture_attributes);
        assert!(!config.debug);
        assert!(config.side_callback.is_none());
    }
    
    #[test]
    fn test_camel_case_and_unknown_keys() {
        let config = Config::from_json(r#"{
            "endpoint": "https://c.example/save",
            "flushIntervalSeconds": 1,
            "regularEvents": "click",
            "pollingEvents": ["mousemove", "scroll"],
            "pollingIntervalMs": 0,
            "layoutType": "liquid"
        }"#).unwrap();
        
        assert_eq!(config.endpoint, "https://c.example/save");
        assert_eq!(config.flush_interval_seconds, 1);
        assert_eq!(config.regular_events, EventSelection::Names(vec!["click".into()]));
        assert_eq!(config.polling_events.names(), ["mousemove", "scroll"]);
        assert_eq!(config.polling_interval_ms, 0);
    }
    
    #[test]
    fn test_legacy_aliases() {
        let config = Config::from_json(r#"{
            "postServer": "http://old.example/save.php",
            "postInterval": 5,
            "pollingMs": 50,
            "taskName": "campaign-7"
        }"#).unwrap();
        
        assert_eq!(config.endpoint, "http://old.example/save.php");
        assert_eq!(config.flush_interval_seconds, 5);
        assert_eq!(config.polling_interval_ms, 50);
        assert_eq!(config.task_label, "campaign-7");
    }
    
    #[test]
    fn test_null_keeps_default() {
        let config = Config::from_json(r#"{"pollingMs": null, "taskName": null}"#).unwrap();
        assert_eq!(config.polling_interval_ms, 150);
        assert_eq!(config.task_label, "evtrack");
    }
    
    #[test]
    fn test_selection_parse() {
        assert_eq!(EventSelection::parse("*"), EventSelection::All);
        assert_eq!(EventSelection::parse("click *"), EventSelection::All);
        assert_eq!(
            EventSelection::parse("click, keydown  click"),
            EventSelection::Names(vec!["click".into(), "keydown".into()])
        );
        assert_eq!(EventSelection::parse(""), EventSelection::none());
    }
    
    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config::from_json(r#"{"flushIntervalSeconds": 0}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFlushInterval)));
        assert!(Config::default().validate().is_ok());
    }
    
    #[test]
    fn test_malformed_json() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Json(_))));
        assert!(Config::from_json(r#"{"postInterval": "soon"}"#).is_err());
    }
    
    #[test]
    fn test_side_callback() {
        let config = Config::default().with_side_callback(|_| serde_json::json!({"k": 1}));
        assert!(config.side_callback.is_some());
        assert!(format!("{:?}", config).contains("side_callback: true"));
    }
}
