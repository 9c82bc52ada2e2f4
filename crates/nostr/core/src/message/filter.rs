use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subscription filter sent inside a `REQ` message.
///
/// Unset fields are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    /// Event IDs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Authors (pubkeys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    /// Event kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,

    /// Event ids referenced in `e` tags
    #[serde(rename = "#e", default, skip_serializing_if = "Option::is_none")]
    pub event_refs: Option<Vec<String>>,

    /// Pubkeys referenced in `p` tags
    #[serde(rename = "#p", default, skip_serializing_if = "Option::is_none")]
    pub pubkey_refs: Option<Vec<String>>,

    /// Events since timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,

    /// Events until timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,

    /// Maximum number of events in the initial batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Other tag queries keyed with their `#` prefix (`#a`, `#t`, ...) and
    /// extension fields such as NIP-50 `search`
    #[serde(flatten)]
    pub additional_data: Map<String, Value>,
}

impl Filter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn authors(mut self, authors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u16>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Filter by #e (event reference) tags.
    pub fn event_refs(mut self, event_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.event_refs = Some(event_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Filter by #p (pubkey reference) tags.
    pub fn pubkey_refs(mut self, pubkeys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pubkey_refs = Some(pubkeys.into_iter().map(Into::into).collect());
        self
    }

    pub fn since(mut self, timestamp: u64) -> Self {
        self.since = Some(timestamp);
        self
    }

    pub fn until(mut self, timestamp: u64) -> Self {
        self.until = Some(timestamp);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Add a tag filter. The key is the tag letter without `#`.
    ///
    /// `e` and `p` go to their dedicated fields.
    pub fn tag(self, key: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        match key {
            "e" => self.event_refs(values),
            "p" => self.pubkey_refs(values),
            _ => {
                let mut filter = self;
                filter.additional_data.insert(
                    format!("#{key}"),
                    Value::Array(
                        values
                            .into_iter()
                            .map(|value| Value::String(value.into()))
                            .collect(),
                    ),
                );
                filter
            }
        }
    }
}
