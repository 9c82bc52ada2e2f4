//! NIP-02: Contact lists.
//!
//! A kind-3 event lists followed profiles as `p` tags. Its content may carry a
//! JSON object mapping relay URLs to read/write flags.

use crate::nip01::{Event, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read/write usage of one relay in a contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayPolicy {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Relay URL to policy, as found in a kind-3 event's content.
pub type RelayList = BTreeMap<String, RelayPolicy>;

/// A kind-3 event with its relay map parsed.
///
/// Content that is empty or not a relay map yields an empty `relays`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactsEvent {
    pub event: Event,
    pub relays: RelayList,
}

impl ContactsEvent {
    pub fn from_event(event: Event) -> Self {
        let relays = serde_json::from_str(&event.content).unwrap_or_default();
        Self { event, relays }
    }

    /// Pubkeys of followed profiles, in tag order.
    pub fn contacts(&self) -> impl Iterator<Item = &str> {
        self.event.tags.profiles().filter_map(Tag::first_value)
    }
}
