use super::{Nip19Error, Result};

pub const TLV_SPECIAL: u8 = 0;
pub const TLV_RELAY: u8 = 1;
pub const TLV_AUTHOR: u8 = 2;
pub const TLV_KIND: u8 = 3;

/// A single tag-length-value entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvEntry {
    pub tag: u8,
    pub value: Vec<u8>,
}

impl TlvEntry {
    pub fn new(tag: u8, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// Split a TLV byte string into entries, in order.
///
/// Lengths up to 127 take one byte. Longer values set the top bit and
/// store, in the low seven bits, how many big-endian length bytes follow.
pub fn parse_tlv(data: &[u8]) -> Result<Vec<TlvEntry>> {
    let mut entries = Vec::new();
    let mut position = 0;

    while position < data.len() {
        let tag = data[position];
        let first = *data
            .get(position + 1)
            .ok_or_else(|| Nip19Error::Tlv(format!("missing length for tag {tag}")))?;
        position += 2;

        let length = if first & 0x80 == 0 {
            usize::from(first)
        } else {
            let width = usize::from(first & 0x7f);
            if width == 0 || width > std::mem::size_of::<u32>() {
                return Err(Nip19Error::Tlv(format!("unsupported length width {width}")));
            }
            let bytes = data
                .get(position..position + width)
                .ok_or_else(|| Nip19Error::Tlv(format!("truncated length for tag {tag}")))?;
            position += width;
            bytes
                .iter()
                .fold(0usize, |length, byte| (length << 8) | usize::from(*byte))
        };

        let value = data
            .get(position..position + length)
            .ok_or_else(|| Nip19Error::Tlv(format!("truncated value for tag {tag}")))?;
        entries.push(TlvEntry::new(tag, value));
        position += length;
    }

    Ok(entries)
}

/// Concatenate entries into a TLV byte string.
pub fn build_tlv(entries: &[TlvEntry]) -> Vec<u8> {
    let mut output = Vec::new();
    for entry in entries {
        output.push(entry.tag);
        let length = entry.value.len();
        if length <= 0x7f {
            output.push(length as u8);
        } else {
            let be = length.to_be_bytes();
            let skip = be.iter().take_while(|byte| **byte == 0).count();
            let significant = &be[skip..];
            output.push(0x80 | significant.len() as u8);
            output.extend_from_slice(significant);
        }
        output.extend_from_slice(&entry.value);
    }
    output
}
