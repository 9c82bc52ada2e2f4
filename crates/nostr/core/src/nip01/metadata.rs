use super::Event;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile information carried as JSON in a kind-0 event's content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip05: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lud16: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip57: Option<String>,
    /// Fields not listed above (`display_name`, `website`, ...)
    #[serde(flatten)]
    pub additional_data: Map<String, Value>,
}

/// A kind-0 event with its content parsed.
///
/// `metadata` is `None` when the content is not a JSON object of the
/// expected shape; the event itself is still usable.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEvent {
    pub event: Event,
    pub metadata: Option<Metadata>,
}

impl MetadataEvent {
    pub fn from_event(event: Event) -> Self {
        let metadata = serde_json::from_str(&event.content).ok();
        Self { event, metadata }
    }
}
