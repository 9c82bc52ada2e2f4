//! A direct message from composition to decryption, through the wire codec.

#![cfg(feature = "full")]

use nostr_core::nip19;
use nostr_core::{
    EventRequest, EventTemplate, InboundFrame, Keypair, PublicKey, TypedEvent, WireCodec,
};

#[test]
fn direct_message_survives_the_relay_round_trip() -> anyhow::Result<()> {
    let alice = Keypair::generate();
    let bob = Keypair::generate();

    // Bob's key reaches Alice as an npub
    let (hrp, bob_hex) = nip19::to_hex(&bob.npub()?)?;
    assert_eq!(hrp, "npub");
    let bob_public = PublicKey::from_hex(&bob_hex)?;
    assert_eq!(bob_public, bob.public_key);

    let draft = EventTemplate::text_note("meet at noon").into_event();
    let encrypted = draft.encrypt_direct(&alice.private_key, &bob_public)?;
    let signed = encrypted.event.sign(&alice.private_key)?;
    assert!(signed.is_signature_valid());
    assert_eq!(signed.kind, 4);

    let codec = WireCodec::default();
    let outbound = codec.serialize(&EventRequest::new(signed.clone()))?;
    assert!(outbound.starts_with(r#"["EVENT",{"#));

    // what a relay sends back to a subscriber
    let inbound = format!(r#"["EVENT","dms",{}]"#, serde_json::to_string(&signed)?);
    let InboundFrame::Event(response) = codec.decode_frame(&inbound) else {
        anyhow::bail!("relay frame should decode as EVENT");
    };
    assert_eq!(response.subscription_id.as_deref(), Some("dms"));

    let Some(TypedEvent::EncryptedDirectMessage(message)) = response.event else {
        anyhow::bail!("kind 4 should decode as an encrypted direct message");
    };
    assert!(message.event.is_signature_valid());
    assert_eq!(message.recipient_pubkey, Some(bob_public.to_hex()));
    assert_eq!(message.decrypt(&bob.private_key)?, "meet at noon");
    assert_eq!(message.decrypt(&alice.private_key)?, "meet at noon");

    let stranger = Keypair::generate();
    assert!(message.decrypt(&stranger.private_key).is_err());

    let note_id = signed.id.clone().unwrap_or_default();
    let (hrp, hex) = nip19::to_hex(&nip19::to_note(&note_id)?)?;
    assert_eq!(hrp, "note");
    assert_eq!(hex, note_id);
    Ok(())
}
