//! NIP-04: Encrypted direct messages.
//!
//! Content is AES-256-CBC encrypted with the ECDH shared x-coordinate of the
//! two parties and stored as `base64(ciphertext)?iv=base64(iv)`. The recipient
//! is the event's single `p` tag, so either party can decrypt later with only
//! their own private key.
//!
//! NIP-04 leaks metadata and is deprecated in favour of NIP-17/NIP-44; it is
//! kept for interoperability with existing clients.

use crate::nip01::{Event, Tag};
use thiserror::Error;

#[cfg(feature = "full")]
use crate::keys::{KeyError, PrivateKey, PublicKey};
#[cfg(feature = "full")]
use crate::nip01::KIND_ENCRYPTED_DIRECT_MESSAGE;

const IV_SEPARATOR: &str = "?iv=";

#[derive(Debug, Error)]
pub enum Nip04Error {
    #[error("recipient pubkey is not specified")]
    MissingRecipient,

    #[error("event carries {0} p tags, expected exactly one recipient")]
    AmbiguousRecipient(usize),

    #[error("event is addressed to {found}, not to {expected}")]
    RecipientMismatch { expected: String, found: String },

    #[error("sender pubkey is not specified")]
    MissingSender,

    #[error("encrypted content is missing")]
    MissingContent,

    #[error("initialization vector is missing")]
    MissingIv,

    #[error("event is not for the given private key: sender or recipient pubkey doesn't match")]
    KeyMismatch,

    #[cfg(feature = "full")]
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[cfg(feature = "full")]
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("decrypted content is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Nip04Error>;

/// An event whose content is NIP-04 ciphertext, split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedEvent {
    pub event: Event,
    /// Base64 ciphertext before the `?iv=` separator
    pub encrypted_content: Option<String>,
    /// Base64 IV after the separator
    pub initialization_vector: Option<String>,
    pub recipient_pubkey: Option<String>,
}

impl EncryptedEvent {
    pub fn from_event(event: Event) -> Self {
        let (encrypted_content, initialization_vector) = split_content(&event.content);
        let recipient_pubkey = event
            .tags
            .find_first_value(Tag::PROFILE)
            .map(str::to_string);
        Self {
            event,
            encrypted_content,
            initialization_vector,
            recipient_pubkey,
        }
    }
}

fn split_content(content: &str) -> (Option<String>, Option<String>) {
    if content.trim().is_empty() {
        return (None, None);
    }
    match content.split_once(IV_SEPARATOR) {
        Some((text, iv)) => (Some(text.to_string()), Some(iv.to_string())),
        None => (Some(content.to_string()), None),
    }
}

#[cfg(feature = "full")]
mod crypto {
    use super::*;
    use aes::Aes256;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use cbc::cipher::block_padding::Pkcs7;
    use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
    use rand::RngCore;

    type Aes256CbcEnc = cbc::Encryptor<Aes256>;
    type Aes256CbcDec = cbc::Decryptor<Aes256>;

    const IV_SIZE: usize = 16;

    fn recipients(event: &Event) -> Vec<&str> {
        event.tags.profiles().filter_map(Tag::first_value).collect()
    }

    impl EncryptedEvent {
        /// Encrypt `event` for the pubkey in its `p` tag, keeping its kind.
        ///
        /// The result is unsigned: `id` and `sig` are cleared, `pubkey` is
        /// the sender's.
        pub fn encrypt(event: &Event, sender: &PrivateKey) -> Result<Self> {
            Self::encrypt_with_kind(event, sender, event.kind)
        }

        /// Like [`EncryptedEvent::encrypt`], forcing kind 4.
        pub fn encrypt_direct_message(event: &Event, sender: &PrivateKey) -> Result<Self> {
            Self::encrypt_with_kind(event, sender, KIND_ENCRYPTED_DIRECT_MESSAGE)
        }

        /// Encrypt for the single `p` tag recipient. More than one `p` tag
        /// is rejected since the ciphertext can only be read by one party.
        pub fn encrypt_with_kind(event: &Event, sender: &PrivateKey, kind: u16) -> Result<Self> {
            let recipient = match recipients(event).as_slice() {
                [] => return Err(Nip04Error::MissingRecipient),
                [recipient] => *recipient,
                many => return Err(Nip04Error::AmbiguousRecipient(many.len())),
            };
            let recipient = PublicKey::from_hex(recipient)?;
            let shared_key = sender.shared_key(&recipient);

            let mut iv = [0u8; IV_SIZE];
            rand::rng().fill_bytes(&mut iv);

            let ciphertext = Aes256CbcEnc::new_from_slices(&shared_key, &iv)
                .map_err(|e| Nip04Error::Cipher(e.to_string()))?
                .encrypt_padded_vec_mut::<Pkcs7>(event.content.as_bytes());

            let encrypted = Event {
                id: None,
                pubkey: Some(sender.public_key().to_hex()),
                kind,
                content: format!(
                    "{}{IV_SEPARATOR}{}",
                    STANDARD.encode(ciphertext),
                    STANDARD.encode(iv)
                ),
                sig: None,
                ..event.clone()
            };
            Ok(Self::from_event(encrypted))
        }

        /// Decrypt with either party's private key.
        pub fn decrypt(&self, key: &PrivateKey) -> Result<String> {
            let text = self
                .encrypted_content
                .as_deref()
                .ok_or(Nip04Error::MissingContent)?;
            let iv = self
                .initialization_vector
                .as_deref()
                .ok_or(Nip04Error::MissingIv)?;
            let recipient = self
                .recipient_pubkey
                .as_deref()
                .ok_or(Nip04Error::MissingRecipient)?;
            let sender = self
                .event
                .pubkey
                .as_deref()
                .ok_or(Nip04Error::MissingSender)?;

            let own = key.public_key().to_hex();
            let counterparty = if sender.eq_ignore_ascii_case(&own) {
                recipient
            } else if recipient.eq_ignore_ascii_case(&own) {
                sender
            } else {
                return Err(Nip04Error::KeyMismatch);
            };

            let shared_key = key.shared_key(&PublicKey::from_hex(counterparty)?);
            let ciphertext = STANDARD.decode(text)?;
            let iv = STANDARD.decode(iv)?;

            let plaintext = Aes256CbcDec::new_from_slices(&shared_key, &iv)
                .map_err(|e| Nip04Error::Cipher(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|e| Nip04Error::Cipher(e.to_string()))?;
            Ok(String::from_utf8(plaintext)?)
        }
    }

    impl Event {
        /// Encrypt this event for `receiver`, adding their `p` tag when the
        /// event has none. An event already addressed elsewhere is rejected.
        pub fn encrypt(&self, sender: &PrivateKey, receiver: &PublicKey) -> Result<EncryptedEvent> {
            EncryptedEvent::encrypt(&self.with_recipient(receiver)?, sender)
        }

        /// Like [`Event::encrypt`], producing a kind-4 direct message.
        pub fn encrypt_direct(
            &self,
            sender: &PrivateKey,
            receiver: &PublicKey,
        ) -> Result<EncryptedEvent> {
            EncryptedEvent::encrypt_direct_message(&self.with_recipient(receiver)?, sender)
        }

        fn with_recipient(&self, receiver: &PublicKey) -> Result<Event> {
            let receiver = receiver.to_hex();
            match recipients(self).as_slice() {
                [] => {
                    let mut event = self.clone();
                    event.tags.push(Tag::profile(receiver));
                    Ok(event)
                }
                [found] if found.eq_ignore_ascii_case(&receiver) => Ok(self.clone()),
                [found] => Err(Nip04Error::RecipientMismatch {
                    expected: receiver,
                    found: (*found).to_string(),
                }),
                many => Err(Nip04Error::AmbiguousRecipient(many.len())),
            }
        }
    }
}

#[cfg(all(test, feature = "full"))]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;
    use crate::nip01::{EventTemplate, KIND_SHORT_TEXT_NOTE};

    const USER1_NSEC: &str = "nsec1l0a7m5dlg4h9wurhnmgsq5nv9cqyvdwsutk4yf3w4fzzaqw7n80ssdfzkg";
    const USER2_NSEC: &str = "nsec1phvgvjs596qq0tq2h98xyunqg8r38yvwfg7pxt8mucfvr0jtlvks9k7uzu";
    const STRANGER_NSEC: &str = "nsec10jj7d532su7gunn6rnpezgwyr0nvd55r4whppj4t64xux03sxvwsd4n5my";

    fn received_message() -> EncryptedEvent {
        let event = Event {
            id: Some(
                "d7c4ecbf0ea0539125444127a44b060270918867a73ce2c0bac7127066cb71bc".to_string(),
            ),
            pubkey: Some(
                "7e8575871843980ffee6f8bcd37cc381589b5653bb8a1b3e585bf5e2a5c15f78".to_string(),
            ),
            created_at: 1678445884,
            kind: 4,
            tags: vec![Tag::profile(
                "d27790fcb3f9afa0d709b2e9c5995151bc5ad008079bd0a474aa101d80e0eed3",
            )]
            .into(),
            content: "RzHxmB2DffNSIvLliVkzkA==?iv=zKlGqw6+aBBpjaFS0p1Haw==".to_string(),
            sig: Some("7a6cffef01dafcf5a2ab096df4cc1dd411461604675df014311ad85ccbb616f82ae85ccba81a72b00f62b21e648d4160b8b54e324e85319ca4617575167c4c65".to_string()),
            ..Event::default()
        };
        EncryptedEvent::from_event(event)
    }

    #[test]
    fn test_received_message_decrypts_for_both_parties() -> anyhow::Result<()> {
        let message = received_message();
        assert_eq!(
            message.encrypted_content.as_deref(),
            Some("RzHxmB2DffNSIvLliVkzkA==")
        );
        assert_eq!(
            message.initialization_vector.as_deref(),
            Some("zKlGqw6+aBBpjaFS0p1Haw==")
        );

        let user1 = PrivateKey::from_bech32(USER1_NSEC)?;
        let user2 = PrivateKey::from_bech32(USER2_NSEC)?;
        assert_eq!(message.decrypt(&user1)?, "Hey from user 1");
        assert_eq!(message.decrypt(&user2)?, "Hey from user 1");
        Ok(())
    }

    #[test]
    fn test_third_party_key_is_rejected() -> anyhow::Result<()> {
        let stranger = PrivateKey::from_bech32(STRANGER_NSEC)?;
        let result = received_message().decrypt(&stranger);
        assert!(matches!(result, Err(Nip04Error::KeyMismatch)));
        Ok(())
    }

    #[test]
    fn test_encrypt_direct_round_trip() -> anyhow::Result<()> {
        let user1 = PrivateKey::from_bech32(USER1_NSEC)?;
        let user2 = PrivateKey::from_bech32(USER2_NSEC)?;
        let user2_public = user2.public_key();

        let note = EventTemplate::text_note("Hey from user 1")
            .with_created_at(1678445884)
            .into_event();
        let encrypted = note.encrypt_direct(&user1, &user2_public)?;

        assert_eq!(encrypted.event.kind, KIND_ENCRYPTED_DIRECT_MESSAGE);
        assert_eq!(encrypted.event.created_at, 1678445884);
        assert_eq!(encrypted.recipient_pubkey, Some(user2_public.to_hex()));
        assert_eq!(
            encrypted.event.pubkey,
            Some(user1.public_key().to_hex())
        );
        assert!(encrypted.event.id.is_none());
        assert!(encrypted.event.sig.is_none());
        assert_ne!(encrypted.event.content, "Hey from user 1");

        assert_eq!(encrypted.decrypt(&user1)?, "Hey from user 1");
        assert_eq!(encrypted.decrypt(&user2)?, "Hey from user 1");
        Ok(())
    }

    #[test]
    fn test_encrypt_keeps_kind_and_single_recipient_tag() -> anyhow::Result<()> {
        let user1 = PrivateKey::generate();
        let user2 = PrivateKey::generate();
        let receiver = user2.public_key();

        let note = EventTemplate::new(8)
            .with_content("badge for you")
            .with_tag(Tag::profile(receiver.to_hex()))
            .into_event();
        let encrypted = note.encrypt(&user1, &receiver)?;

        assert_eq!(encrypted.event.kind, 8);
        assert_eq!(encrypted.event.tags.profiles().count(), 1);
        assert_eq!(encrypted.decrypt(&user2)?, "badge for you");
        // source event is untouched
        assert_eq!(note.content, "badge for you");
        assert!(note.pubkey.is_none());
        Ok(())
    }

    #[test]
    fn test_encrypt_without_recipient_fails() {
        let sender = PrivateKey::generate();
        let note = EventTemplate::new(KIND_SHORT_TEXT_NOTE)
            .with_content("to nobody")
            .into_event();
        let result = EncryptedEvent::encrypt(&note, &sender);
        assert!(matches!(result, Err(Nip04Error::MissingRecipient)));
    }

    #[test]
    fn test_encrypt_refuses_event_addressed_elsewhere() {
        let sender = PrivateKey::generate();
        let intended = PrivateKey::generate().public_key();
        let other = PrivateKey::generate().public_key();

        let note = EventTemplate::new(KIND_SHORT_TEXT_NOTE)
            .with_content("for someone else")
            .with_tag(Tag::profile(other.to_hex()))
            .into_event();

        let result = note.encrypt_direct(&sender, &intended);
        assert!(matches!(
            result,
            Err(Nip04Error::RecipientMismatch { expected, found })
                if expected == intended.to_hex() && found == other.to_hex()
        ));
    }

    #[test]
    fn test_encrypt_refuses_several_recipients() {
        let sender = PrivateKey::generate();
        let first = PrivateKey::generate().public_key();
        let second = PrivateKey::generate().public_key();

        let note = EventTemplate::new(KIND_SHORT_TEXT_NOTE)
            .with_content("group chat")
            .with_tag(Tag::profile(first.to_hex()))
            .with_tag(Tag::profile(second.to_hex()))
            .into_event();

        assert!(matches!(
            EncryptedEvent::encrypt_direct_message(&note, &sender),
            Err(Nip04Error::AmbiguousRecipient(2))
        ));
        assert!(matches!(
            note.encrypt(&sender, &first),
            Err(Nip04Error::AmbiguousRecipient(2))
        ));
    }

    #[test]
    fn test_decrypt_reports_missing_parts() -> anyhow::Result<()> {
        let key = PrivateKey::from_bech32(USER1_NSEC)?;

        let mut no_iv = received_message();
        no_iv.initialization_vector = None;
        assert!(matches!(no_iv.decrypt(&key), Err(Nip04Error::MissingIv)));

        let mut no_sender = received_message();
        no_sender.event.pubkey = None;
        assert!(matches!(
            no_sender.decrypt(&key),
            Err(Nip04Error::MissingSender)
        ));

        let mut no_recipient = received_message();
        no_recipient.recipient_pubkey = None;
        assert!(matches!(
            no_recipient.decrypt(&key),
            Err(Nip04Error::MissingRecipient)
        ));
        Ok(())
    }

    #[test]
    fn test_content_without_separator() {
        let view = EncryptedEvent::from_event(Event {
            content: "c2VjcmV0".to_string(),
            ..Event::default()
        });
        assert_eq!(view.encrypted_content.as_deref(), Some("c2VjcmV0"));
        assert!(view.initialization_vector.is_none());
        assert!(view.recipient_pubkey.is_none());
    }
}
