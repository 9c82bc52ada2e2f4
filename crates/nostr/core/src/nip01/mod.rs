//! NIP-01: Basic protocol flow description.
//!
//! This module implements the core Nostr event structure and operations:
//! - Event structure (id, pubkey, created_at, kind, tags, content, sig) with
//!   unknown top-level fields preserved
//! - Canonical serialization and id hashing
//! - Event signing with deterministic Schnorr signatures and verification
//! - Tags as positional arrays with an open-ended tail
//! - Kind constants and classification (regular, replaceable, ephemeral, addressable)
//! - Profile metadata (kind 0 content)
//!
//! Internal module boundaries:
//! - `event`: `Event`, `EventTemplate`, id/sign/verify
//! - `tag`: `Tag`, `Tags` and lookup helpers
//! - `kinds`: kind constants and classification
//! - `metadata`: kind-0 profile content
//! - `tests`: vectors and signing coverage

mod event;
mod kinds;
mod metadata;
mod tag;

pub use event::{Event, EventTemplate, unix_now_secs};
pub use kinds::*;
pub use metadata::{Metadata, MetadataEvent};
pub use tag::{Tag, Tags};

use crate::keys::KeyError;
use thiserror::Error;

/// Errors that can occur during NIP-01 operations.
#[derive(Debug, Error)]
pub enum Nip01Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event has no pubkey")]
    MissingPubkey,

    #[error("event has no signature")]
    MissingSignature,

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

pub type Result<T> = std::result::Result<T, Nip01Error>;
