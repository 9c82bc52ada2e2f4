//! secp256k1 key wrappers used across the protocol.
//!
//! Private keys are 32-byte scalars, public keys are BIP-340 x-only points.
//! Both round-trip through lowercase hex and their NIP-19 bech32 forms
//! (`nsec` / `npub`).

use crate::bech32::{self, Bech32Error};
use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::{self, Message, Parity, SecretKey, XOnlyPublicKey, ecdh, schnorr};
use rand::RngCore;
use std::fmt;
use thiserror::Error;

pub const NSEC_HRP: &str = "nsec";
pub const NPUB_HRP: &str = "npub";

/// Key parsing and conversion failures.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] secp256k1::Error),

    #[error("bech32 error: {0}")]
    Bech32(#[from] Bech32Error),

    #[error("expected {expected} prefix, got {actual}")]
    UnexpectedHrp {
        expected: &'static str,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, KeyError>;

/// A secp256k1 secret scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: SecretKey,
}

impl PrivateKey {
    /// Draw a fresh key from the thread-local RNG.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // Rejects zero and values above the curve order; astronomically rare.
            if let Ok(secret) = SecretKey::from_slice(&bytes) {
                return Self { secret };
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        Ok(Self {
            secret: SecretKey::from_slice(bytes)?,
        })
    }

    pub fn from_hex(hex_key: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_key.trim())?)
    }

    /// Parse an `nsec1...` string.
    pub fn from_bech32(encoded: &str) -> Result<Self> {
        Self::from_bytes(&decode_with_hrp(encoded, NSEC_HRP)?)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_bech32(&self) -> Result<String> {
        Ok(bech32::encode(NSEC_HRP, &self.to_bytes())?)
    }

    /// Derive the x-only public key.
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        let (key, _parity) = self.secret.x_only_public_key(&secp);
        PublicKey { key }
    }

    /// ECDH shared secret with `peer`: the x coordinate of `self * peer`.
    ///
    /// The peer's x-only key is lifted with even parity, which is what NIP-04
    /// expects; the result is symmetric between the two parties.
    pub fn shared_key(&self, peer: &PublicKey) -> [u8; 32] {
        let point = ecdh::shared_secret_point(&peer.key.public_key(Parity::Even), &self.secret);
        let mut shared = [0u8; 32];
        shared.copy_from_slice(&point[..32]);
        shared
    }

    /// Deterministic BIP-340 signature (no auxiliary randomness) over a 32-byte digest.
    pub fn sign_schnorr(&self, digest: &[u8; 32]) -> [u8; 64] {
        let secp = Secp256k1::signing_only();
        let keypair = secp256k1::Keypair::from_secret_key(&secp, &self.secret);
        secp.sign_schnorr_no_aux_rand(&Message::from_digest(*digest), &keypair)
            .serialize()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

/// A BIP-340 x-only public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key: XOnlyPublicKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        Ok(Self {
            key: XOnlyPublicKey::from_slice(bytes)?,
        })
    }

    pub fn from_hex(hex_key: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_key.trim())?)
    }

    /// Parse an `npub1...` string.
    pub fn from_bech32(encoded: &str) -> Result<Self> {
        Self::from_bytes(&decode_with_hrp(encoded, NPUB_HRP)?)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.key.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_bech32(&self) -> Result<String> {
        Ok(bech32::encode(NPUB_HRP, &self.to_bytes())?)
    }

    /// The underlying curve point.
    pub fn x_only(&self) -> XOnlyPublicKey {
        self.key
    }

    /// Check a 64-byte BIP-340 signature over a 32-byte digest.
    pub fn verify_schnorr(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        let Ok(signature) = schnorr::Signature::from_slice(signature) else {
            return false;
        };
        let secp = Secp256k1::verification_only();
        secp.verify_schnorr(&signature, &Message::from_digest(*digest), &self.key)
            .is_ok()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A private key together with its derived public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn npub(&self) -> Result<String> {
        self.public_key.to_bech32()
    }

    pub fn nsec(&self) -> Result<String> {
        self.private_key.to_bech32()
    }
}

fn decode_with_hrp(encoded: &str, expected: &'static str) -> Result<Vec<u8>> {
    let (hrp, data) = bech32::decode(encoded.trim())?;
    if hrp != expected {
        return Err(KeyError::UnexpectedHrp {
            expected,
            actual: hrp,
        });
    }
    Ok(data)
}
