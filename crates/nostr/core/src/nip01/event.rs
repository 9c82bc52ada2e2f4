use super::{Nip01Error, Result, Tag, Tags};
use crate::keys::{PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// A Nostr event.
///
/// `id`, `pubkey` and `sig` stay empty until the event is signed. Fields the
/// struct does not model are kept in `additional_data` and written back out
/// unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 32-bytes lowercase hex-encoded public key of the event creator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    /// Unix timestamp in seconds
    #[serde(default)]
    pub created_at: u64,
    /// Event kind (integer between 0 and 65535)
    #[serde(default)]
    pub kind: u16,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub content: String,
    /// 64-bytes lowercase hex signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(flatten)]
    pub additional_data: Map<String, Value>,
}

impl Event {
    /// Canonical form hashed into the id: `[0,pubkey,created_at,kind,tags,content]`.
    pub fn canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&(
            0,
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        ))?)
    }

    pub fn compute_digest(&self) -> Result<[u8; 32]> {
        let canonical = self.canonical_json()?;
        Ok(Sha256::digest(canonical.as_bytes()).into())
    }

    /// Hex id derived from the current contents, ignoring any stored `id`.
    pub fn compute_id(&self) -> Result<String> {
        Ok(hex::encode(self.compute_digest()?))
    }

    /// Return a signed copy: pubkey set from `key`, id recomputed, then signed.
    pub fn sign(&self, key: &PrivateKey) -> Result<Event> {
        let mut signed = self.clone();
        signed.pubkey = Some(key.public_key().to_hex());
        let digest = signed.compute_digest()?;
        signed.id = Some(hex::encode(digest));
        signed.sig = Some(hex::encode(key.sign_schnorr(&digest)));
        Ok(signed)
    }

    /// Verify the signature against the recomputed id.
    ///
    /// A stored id that disagrees with the contents makes the event invalid.
    pub fn verify_signature(&self) -> Result<bool> {
        let pubkey = self.pubkey.as_deref().ok_or(Nip01Error::MissingPubkey)?;
        let sig = self.sig.as_deref().ok_or(Nip01Error::MissingSignature)?;
        let public_key = PublicKey::from_hex(pubkey)?;

        let digest = self.compute_digest()?;
        if let Some(id) = &self.id
            && !id.eq_ignore_ascii_case(&hex::encode(digest))
        {
            return Ok(false);
        }

        Ok(public_key.verify_schnorr(&digest, &hex::decode(sig)?))
    }

    /// Lenient form of [`Event::verify_signature`]: any error counts as invalid.
    pub fn is_signature_valid(&self) -> bool {
        self.verify_signature().unwrap_or(false)
    }
}

/// Mutable construction form of an event.
///
/// Collect kind, content and tags here, then either freeze it with
/// [`EventTemplate::into_event`] or sign it directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTemplate {
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub created_at: u64,
}

impl EventTemplate {
    /// Start a template stamped with the current time.
    pub fn new(kind: u16) -> Self {
        Self {
            kind,
            created_at: unix_now_secs().unwrap_or(0),
            ..Self::default()
        }
    }

    pub fn text_note(content: impl Into<String>) -> Self {
        Self::new(super::KIND_SHORT_TEXT_NOTE).with_content(content)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Freeze into an unsigned event.
    pub fn into_event(self) -> Event {
        Event {
            created_at: self.created_at,
            kind: self.kind,
            tags: Tags::from(self.tags),
            content: self.content,
            ..Event::default()
        }
    }

    pub fn sign(self, key: &PrivateKey) -> Result<Event> {
        self.into_event().sign(key)
    }
}

/// Seconds since the Unix epoch.
pub fn unix_now_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
