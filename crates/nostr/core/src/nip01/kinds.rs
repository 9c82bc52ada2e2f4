// Standard event kinds
pub const KIND_METADATA: u16 = 0;
pub const KIND_SHORT_TEXT_NOTE: u16 = 1;
pub const KIND_RECOMMEND_RELAY: u16 = 2;
pub const KIND_CONTACTS: u16 = 3;
pub const KIND_ENCRYPTED_DIRECT_MESSAGE: u16 = 4;
pub const KIND_EVENT_DELETION: u16 = 5;
pub const KIND_REACTION: u16 = 7;

// Public chat (NIP-28)
pub const KIND_CHANNEL_CREATION: u16 = 40;
pub const KIND_CHANNEL_METADATA: u16 = 41;
pub const KIND_CHANNEL_MESSAGE: u16 = 42;
pub const KIND_CHANNEL_HIDE_MESSAGE: u16 = 43;
pub const KIND_CHANNEL_MUTE_USER: u16 = 44;

pub const KIND_REPORTING: u16 = 1984;
pub const KIND_ZAP_REQUEST: u16 = 9734;
pub const KIND_ZAP: u16 = 9735;
pub const KIND_RELAY_LIST_METADATA: u16 = 10002;
pub const KIND_CLIENT_AUTHENTICATION: u16 = 22242;
pub const KIND_NOSTR_CONNECT: u16 = 24133;
pub const KIND_LONG_FORM_CONTENT: u16 = 30023;
pub const KIND_APPLICATION_SPECIFIC_DATA: u16 = 30078;

/// How relays are expected to store an event of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClassification {
    /// Stored as-is
    Regular,
    /// Only the latest per pubkey+kind is kept
    Replaceable,
    /// Not stored
    Ephemeral,
    /// Only the latest per pubkey+kind+`d` tag is kept
    Addressable,
    Unknown,
}

/// Classify an event kind according to NIP-01 rules.
pub fn classify_kind(kind: u16) -> KindClassification {
    let k = u32::from(kind);

    // Regular: 1000 <= n < 10000 || 4 <= n < 45 || n == 1 || n == 2
    if (1000..10000).contains(&k) || (4..45).contains(&k) || k == 1 || k == 2 {
        return KindClassification::Regular;
    }

    // Replaceable: 10000 <= n < 20000 || n == 0 || n == 3
    if (10000..20000).contains(&k) || k == 0 || k == 3 {
        return KindClassification::Replaceable;
    }

    if (20000..30000).contains(&k) {
        return KindClassification::Ephemeral;
    }

    if (30000..40000).contains(&k) {
        return KindClassification::Addressable;
    }

    KindClassification::Unknown
}

pub fn is_replaceable_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Replaceable
}

pub fn is_ephemeral_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Ephemeral
}

pub fn is_addressable_kind(kind: u16) -> bool {
    classify_kind(kind) == KindClassification::Addressable
}
