//! Batch wire format
//!
//! A batch is a flat set of key/value pairs. `info` carries the serialized
//! event records, one per record, joined by [`INFO_SEPARATOR`]; fields inside
//! a record are joined by [`FIELD_SEPARATOR`].

use url::form_urlencoded;

/// Separator between records in `info`
pub const INFO_SEPARATOR: &str = "|||";

/// Separator between fields of one record
pub const FIELD_SEPARATOR: &str = " ";

/// Batch action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// First batch of a session; the collector answers with a session id
    Init,
    /// Later batch for an existing session
    Append,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Append => "append",
        }
    }
}

/// Page geometry sent with `init`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetrics {
    pub url: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub document_width: u32,
    pub document_height: u32,
}

/// One network transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    action: Action,
    records: Vec<String>,
    uid: Option<String>,
    metrics: Option<PageMetrics>,
    task: Option<String>,
}

impl Batch {
    /// First batch of a session
    pub fn init(records: Vec<String>, metrics: PageMetrics, task: &str) -> Self {
        Self {
            action: Action::Init,
            records,
            uid: None,
            metrics: Some(metrics),
            task: Some(task.to_string()),
        }
    }
    
    /// Batch for an already identified session
    pub fn append(uid: &str, records: Vec<String>) -> Self {
        Self {
            action: Action::Append,
            records,
            uid: Some(uid.to_string()),
            metrics: None,
            task: None,
        }
    }
    
    pub fn action(&self) -> Action {
        self.action
    }
    
    pub fn is_init(&self) -> bool {
        self.action == Action::Init
    }
    
    /// Serialized records
    pub fn records(&self) -> &[String] {
        &self.records
    }
    
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    
    /// Session id of an `append` batch
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
    
    /// The `info` field
    pub fn info(&self) -> String {
        self.records.join(INFO_SEPARATOR)
    }
    
    /// Ordered key/value pairs as they go on the wire
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("action", self.action.as_str().to_string()),
            ("info", self.info()),
        ];
        
        if let Some(uid) = &self.uid {
            fields.push(("uid", uid.clone()));
        }
        
        if let Some(m) = &self.metrics {
            fields.extend([
                ("url", m.url.clone()),
                ("screenw", m.screen_width.to_string()),
                ("screenh", m.screen_height.to_string()),
                ("winw", m.window_width.to_string()),
                ("winh", m.window_height.to_string()),
                ("docw", m.document_width.to_string()),
                ("doch", m.document_height.to_string()),
            ]);
        }
        
        if let Some(task) = &self.task {
            fields.push(("task", task.clone()));
        }
        
        fields
    }
    
    /// Value of a single wire field
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields().into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
    
    /// `application/x-www-form-urlencoded` body
    pub fn to_form(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.fields() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
    
    /// JSON object body for `text/plain` delivery
    ///
    /// Values are percent-encoded with `%20` for spaces so a collector can
    /// decode them with a raw URL decode.
    pub fn to_text_json(&self) -> String {
        let object: serde_json::Map<String, serde_json::Value> = self.fields().into_iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(encode_component(&value))))
            .collect();
        serde_json::Value::Object(object).to_string()
    }
}

/// Percent-encode a value, spaces as `%20`
fn encode_component(value: &str) -> String {
    // byte_serialize writes spaces as '+' and escapes literal '+' as %2B
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
