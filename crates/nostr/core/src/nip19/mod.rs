//! NIP-19: bech32-encoded entities
//!
//! Two families share the bech32 text form:
//! - bare entities (`npub`, `nsec`, `note`): the raw 32 bytes, bech32 encoded
//! - shareable identifiers (`nprofile`, `nevent`, `nrelay`, `naddr`): a TLV
//!   payload carrying a primary value plus optional relay hints, author and kind
//!
//! Internal module boundaries:
//! - `tlv`: tag-length-value framing
//! - `tests`: vectors taken from real clients
//!
//! Parsing an identifier with a prefix this module does not know is an
//! error (`Nip19Error::Unsupported`), never a silent `None`.
//!
//! # References
//!
//! - NIP-19: <https://github.com/nostr-protocol/nips/blob/master/19.md>

mod tlv;

pub use tlv::{TLV_AUTHOR, TLV_KIND, TLV_RELAY, TLV_SPECIAL, TlvEntry, build_tlv, parse_tlv};

use crate::bech32::{self, Bech32Error};
use crate::keys::{NPUB_HRP, NSEC_HRP};
use thiserror::Error;

pub const NOTE_HRP: &str = "note";
pub const NPROFILE_HRP: &str = "nprofile";
pub const NEVENT_HRP: &str = "nevent";
pub const NRELAY_HRP: &str = "nrelay";
pub const NADDR_HRP: &str = "naddr";

/// NIP-19 error types
#[derive(Debug, Error)]
pub enum Nip19Error {
    #[error("bech32 error: {0}")]
    Bech32(#[from] Bech32Error),

    #[error("bech32 {0} identifier is not supported")]
    Unsupported(String),

    #[error("invalid TLV payload: {0}")]
    Tlv(String),

    #[error("missing {0} entry")]
    MissingEntry(&'static str),

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid UTF-8 in {0} entry")]
    InvalidUtf8(&'static str),

    #[error("invalid length for {entry}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        entry: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, Nip19Error>;

/// `nprofile`: a pubkey plus relays where it can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIdentifier {
    pub pubkey: String,
    pub relays: Vec<String>,
}

/// `nevent`: an event id with optional relays, author and kind hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentifier {
    pub event_id: String,
    pub relays: Vec<String>,
    pub author: Option<String>,
    pub kind: Option<u32>,
}

/// `nrelay`: a single relay URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayIdentifier {
    pub relay: String,
}

/// `naddr`: the `d` identifier of an addressable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressIdentifier {
    pub identifier: String,
    pub relays: Vec<String>,
    pub author: Option<String>,
    pub kind: Option<u32>,
}

/// Any TLV-based shareable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Profile(ProfileIdentifier),
    Event(EventIdentifier),
    Relay(RelayIdentifier),
    Address(AddressIdentifier),
}

impl Identifier {
    /// Parse an `nprofile`, `nevent`, `nrelay` or `naddr` string.
    pub fn parse(encoded: &str) -> Result<Self> {
        let (hrp, data) = bech32::decode(encoded.trim())?;
        // dispatch on the prefix before touching the payload
        let entries = || -> Result<Vec<TlvEntry>> {
            if data.is_empty() {
                return Err(Nip19Error::MissingEntry("special"));
            }
            parse_tlv(&data)
        };

        match hrp.as_str() {
            NPROFILE_HRP => Ok(Self::Profile(ProfileIdentifier::from_entries(&entries()?)?)),
            NEVENT_HRP => Ok(Self::Event(EventIdentifier::from_entries(&entries()?)?)),
            NRELAY_HRP => Ok(Self::Relay(RelayIdentifier::from_entries(&entries()?)?)),
            NADDR_HRP => Ok(Self::Address(AddressIdentifier::from_entries(&entries()?)?)),
            _ => Err(Nip19Error::Unsupported(hrp)),
        }
    }

    pub fn hrp(&self) -> &'static str {
        match self {
            Self::Profile(_) => NPROFILE_HRP,
            Self::Event(_) => NEVENT_HRP,
            Self::Relay(_) => NRELAY_HRP,
            Self::Address(_) => NADDR_HRP,
        }
    }

    pub fn to_bech32(&self) -> Result<String> {
        let entries = match self {
            Self::Profile(profile) => profile.to_entries()?,
            Self::Event(event) => event.to_entries()?,
            Self::Relay(relay) => relay.to_entries(),
            Self::Address(address) => address.to_entries()?,
        };
        Ok(bech32::encode(self.hrp(), &build_tlv(&entries))?)
    }
}

impl ProfileIdentifier {
    fn from_entries(entries: &[TlvEntry]) -> Result<Self> {
        Ok(Self {
            pubkey: special_hex(entries)?,
            relays: relays(entries)?,
        })
    }

    fn to_entries(&self) -> Result<Vec<TlvEntry>> {
        let mut entries = vec![TlvEntry::new(TLV_SPECIAL, hex::decode(&self.pubkey)?)];
        push_relays(&mut entries, &self.relays);
        Ok(entries)
    }
}

impl EventIdentifier {
    fn from_entries(entries: &[TlvEntry]) -> Result<Self> {
        Ok(Self {
            event_id: special_hex(entries)?,
            relays: relays(entries)?,
            author: author(entries)?,
            kind: kind(entries)?,
        })
    }

    fn to_entries(&self) -> Result<Vec<TlvEntry>> {
        let mut entries = vec![TlvEntry::new(TLV_SPECIAL, hex::decode(&self.event_id)?)];
        if let Some(author) = &self.author {
            entries.push(TlvEntry::new(TLV_AUTHOR, hex::decode(author)?));
        }
        push_relays(&mut entries, &self.relays);
        if let Some(kind) = self.kind {
            entries.push(TlvEntry::new(TLV_KIND, kind.to_be_bytes().to_vec()));
        }
        Ok(entries)
    }
}

impl RelayIdentifier {
    fn from_entries(entries: &[TlvEntry]) -> Result<Self> {
        Ok(Self {
            relay: special_text(entries)?,
        })
    }

    fn to_entries(&self) -> Vec<TlvEntry> {
        vec![TlvEntry::new(TLV_SPECIAL, self.relay.as_bytes())]
    }
}

impl AddressIdentifier {
    fn from_entries(entries: &[TlvEntry]) -> Result<Self> {
        Ok(Self {
            identifier: special_text(entries)?,
            relays: relays(entries)?,
            author: author(entries)?,
            kind: kind(entries)?,
        })
    }

    fn to_entries(&self) -> Result<Vec<TlvEntry>> {
        let mut entries = vec![TlvEntry::new(TLV_SPECIAL, self.identifier.as_bytes())];
        push_relays(&mut entries, &self.relays);
        if let Some(author) = &self.author {
            entries.push(TlvEntry::new(TLV_AUTHOR, hex::decode(author)?));
        }
        if let Some(kind) = self.kind {
            entries.push(TlvEntry::new(TLV_KIND, kind.to_be_bytes().to_vec()));
        }
        Ok(entries)
    }
}

fn special(entries: &[TlvEntry]) -> Result<&[u8]> {
    entries
        .iter()
        .find(|entry| entry.tag == TLV_SPECIAL)
        .map(|entry| entry.value.as_slice())
        .ok_or(Nip19Error::MissingEntry("special"))
}

fn special_hex(entries: &[TlvEntry]) -> Result<String> {
    Ok(hex::encode(special(entries)?))
}

fn special_text(entries: &[TlvEntry]) -> Result<String> {
    String::from_utf8(special(entries)?.to_vec()).map_err(|_| Nip19Error::InvalidUtf8("special"))
}

fn relays(entries: &[TlvEntry]) -> Result<Vec<String>> {
    entries
        .iter()
        .filter(|entry| entry.tag == TLV_RELAY)
        .map(|entry| {
            String::from_utf8(entry.value.clone()).map_err(|_| Nip19Error::InvalidUtf8("relay"))
        })
        .collect()
}

fn author(entries: &[TlvEntry]) -> Result<Option<String>> {
    match entries.iter().find(|entry| entry.tag == TLV_AUTHOR) {
        Some(entry) if entry.value.len() != 32 => Err(Nip19Error::InvalidLength {
            entry: "author",
            expected: 32,
            actual: entry.value.len(),
        }),
        Some(entry) => Ok(Some(hex::encode(&entry.value))),
        None => Ok(None),
    }
}

fn kind(entries: &[TlvEntry]) -> Result<Option<u32>> {
    match entries.iter().find(|entry| entry.tag == TLV_KIND) {
        Some(entry) => {
            let bytes: [u8; 4] =
                entry
                    .value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Nip19Error::InvalidLength {
                        entry: "kind",
                        expected: 4,
                        actual: entry.value.len(),
                    })?;
            Ok(Some(u32::from_be_bytes(bytes)))
        }
        None => Ok(None),
    }
}

fn push_relays(entries: &mut Vec<TlvEntry>, relays: &[String]) {
    entries.extend(
        relays
            .iter()
            .map(|relay| TlvEntry::new(TLV_RELAY, relay.as_bytes())),
    );
}

/// Encode 32 hex-encoded bytes as a bare entity under `hrp`.
pub fn to_bech32(hex_value: &str, hrp: &str) -> Result<String> {
    let bytes = hex::decode(hex_value.trim())?;
    if bytes.len() != 32 {
        return Err(Nip19Error::InvalidLength {
            entry: "entity",
            expected: 32,
            actual: bytes.len(),
        });
    }
    Ok(bech32::encode(hrp, &bytes)?)
}

/// Decode a bare entity into `(hrp, hex)`.
pub fn to_hex(encoded: &str) -> Result<(String, String)> {
    let (hrp, data) = bech32::decode(encoded.trim())?;
    Ok((hrp, hex::encode(data)))
}

pub fn to_npub(pubkey_hex: &str) -> Result<String> {
    to_bech32(pubkey_hex, NPUB_HRP)
}

pub fn to_nsec(private_key_hex: &str) -> Result<String> {
    to_bech32(private_key_hex, NSEC_HRP)
}

pub fn to_note(event_id_hex: &str) -> Result<String> {
    to_bech32(event_id_hex, NOTE_HRP)
}
