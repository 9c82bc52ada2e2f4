//! NIP-57: Zap receipts.
//!
//! Receipts (kind 9735) are published by the recipient's LNURL server. All
//! useful data lives in tags; the view below reads them without validating
//! the payment.

use crate::nip01::{Event, Tag};

const TAG_BOLT11: &str = "bolt11";
const TAG_PREIMAGE: &str = "preimage";
const TAG_DESCRIPTION: &str = "description";

/// A kind-9735 event with its tags read out.
#[derive(Debug, Clone, PartialEq)]
pub struct ZapReceiptEvent {
    pub event: Event,
    /// Recipient's public key (hex), from the `p` tag
    pub recipient_pubkey: Option<String>,
    /// Zapped event id, from the `e` tag
    pub zapped_event: Option<String>,
    /// BOLT-11 invoice text
    pub bolt11: Option<String>,
    pub preimage: Option<String>,
    /// The zap request embedded as JSON in the `description` tag.
    /// `None` when missing or not an event.
    pub zap_request: Option<Event>,
}

impl ZapReceiptEvent {
    pub fn from_event(event: Event) -> Self {
        let tags = &event.tags;
        let value = |identifier: &str| tags.find_first_value(identifier).map(str::to_string);

        let zap_request = tags
            .find_first_value(TAG_DESCRIPTION)
            .and_then(|description| serde_json::from_str(description).ok());

        Self {
            recipient_pubkey: value(Tag::PROFILE),
            zapped_event: value(Tag::EVENT),
            bolt11: value(TAG_BOLT11),
            preimage: value(TAG_PREIMAGE),
            zap_request,
            event,
        }
    }

    /// Pubkey of whoever sent the zap, taken from the embedded request.
    pub fn sender_pubkey(&self) -> Option<&str> {
        self.zap_request.as_ref()?.pubkey.as_deref()
    }
}
