//! Bech32 text encoding for keys and NIP-19 entities.
//!
//! Thin layer over the `bech32` crate. NIP-19 identifiers routinely exceed
//! the 90 character cap of Bitcoin addresses, so strings are checked with
//! [`NostrBech32`]: the BIP-173 checksum with a larger code length.
//! Failures are folded into [`Bech32Error`].

use ::bech32::primitives::decode::{
    CharError, CheckedHrpstring, CheckedHrpstringError, ChecksumError, UncheckedHrpstringError,
};
use ::bech32::primitives::hrp;
use ::bech32::{Checksum, EncodeError, Fe32, Hrp};
use thiserror::Error;

const SEPARATOR: char = '1';

/// BIP-173 checksum without the 90 character limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NostrBech32 {}

impl Checksum for NostrBech32 {
    type MidstateRepr = u32;
    const CODE_LENGTH: usize = 65_535;
    const CHECKSUM_LENGTH: usize = 6;
    const GENERATOR_SH: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];
    const TARGET_RESIDUE: u32 = 1;
}

/// Bech32 failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Bech32Error {
    #[error("mixed-case bech32 string")]
    MixedCase,

    #[error("missing bech32 separator '1'")]
    MissingSeparator,

    #[error("empty human-readable part")]
    EmptyHrp,

    #[error("invalid human-readable part: {0}")]
    InvalidHrp(String),

    #[error("invalid bech32 character {0:?}")]
    InvalidChar(char),

    #[error("data part shorter than the checksum")]
    TooShort,

    #[error("bech32 string too long: {0}")]
    TooLong(String),

    #[error("invalid bech32 checksum")]
    InvalidChecksum,

    #[error("non-zero or excess padding bits")]
    InvalidPadding,
}

pub type Result<T> = std::result::Result<T, Bech32Error>;

/// Encode `data` under the human-readable part `hrp`. Output is lowercase.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String> {
    let hrp = Hrp::parse(hrp).map_err(hrp_error)?;
    ::bech32::encode::<NostrBech32>(hrp, data).map_err(|error| match error {
        EncodeError::TooLong(error) => Bech32Error::TooLong(error.to_string()),
        other => Bech32Error::InvalidHrp(other.to_string()),
    })
}

/// Decode a bech32 string into its lowercase hrp and payload bytes.
pub fn decode(encoded: &str) -> Result<(String, Vec<u8>)> {
    if encoded.len() > NostrBech32::CODE_LENGTH {
        return Err(Bech32Error::TooLong(format!("{} characters", encoded.len())));
    }
    let checked = CheckedHrpstring::new::<NostrBech32>(encoded).map_err(decode_error)?;
    check_padding(encoded)?;
    Ok((checked.hrp().to_lowercase(), checked.byte_iter().collect()))
}

// Trailing bits of the last symbol must be fewer than five and all zero.
fn check_padding(encoded: &str) -> Result<()> {
    let split = encoded.rfind(SEPARATOR).ok_or(Bech32Error::MissingSeparator)?;
    let symbols = &encoded[split + 1..encoded.len() - NostrBech32::CHECKSUM_LENGTH];
    let leftover = symbols.len() * 5 % 8;
    if leftover == 0 {
        return Ok(());
    }
    if leftover >= 5 {
        return Err(Bech32Error::InvalidPadding);
    }

    let last = symbols.chars().last().ok_or(Bech32Error::InvalidPadding)?;
    let value = Fe32::from_char(last.to_ascii_lowercase())
        .map_err(|_| Bech32Error::InvalidChar(last))?
        .to_u8();
    if value & ((1 << leftover) - 1) != 0 {
        return Err(Bech32Error::InvalidPadding);
    }
    Ok(())
}

fn decode_error(error: CheckedHrpstringError) -> Bech32Error {
    match error {
        CheckedHrpstringError::Parse(UncheckedHrpstringError::Char(error)) => match error {
            CharError::MixedCase => Bech32Error::MixedCase,
            CharError::MissingSeparator => Bech32Error::MissingSeparator,
            CharError::InvalidChar(c) => Bech32Error::InvalidChar(c),
            _ => Bech32Error::TooShort,
        },
        CheckedHrpstringError::Parse(UncheckedHrpstringError::Hrp(error)) => hrp_error(error),
        CheckedHrpstringError::Checksum(ChecksumError::InvalidResidue) => {
            Bech32Error::InvalidChecksum
        }
        // what remains are checksum length failures
        _ => Bech32Error::TooShort,
    }
}

fn hrp_error(error: hrp::Error) -> Bech32Error {
    match error {
        hrp::Error::Empty => Bech32Error::EmptyHrp,
        hrp::Error::MixedCase => Bech32Error::MixedCase,
        hrp::Error::NonAsciiChar(c) => Bech32Error::InvalidChar(c),
        other => Bech32Error::InvalidHrp(other.to_string()),
    }
}
