// SPDX-License-Identifier: AGPL-3.0-or-later

//! Canonical varu64 integer encoding used throughout the Bamboo wire format.
//!
//! Values below 248 occupy a single byte. Larger values are prefixed with a
//! length tag (`247 + n`) followed by the minimal `n`-byte big-endian
//! representation. Every value has exactly one valid encoding; padded
//! encodings are rejected on decode.
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeVaru64Error {
    /// Input ended before the announced number of bytes.
    #[error("unexpected end of input while decoding varu64")]
    UnexpectedEof,

    /// The value was encoded with more bytes than necessary.
    #[error("non-canonical varu64 encoding")]
    NonCanonical,
}

/// Number of bytes `encode` will produce for this value.
pub fn encoding_length(value: u64) -> usize {
    match value {
        0..=247 => 1,
        _ => 1 + minimal_bytes(value),
    }
}

/// Appends the canonical encoding of `value` to `out`.
pub fn encode(value: u64, out: &mut Vec<u8>) {
    if value < 248 {
        out.push(value as u8);
        return;
    }

    let len = minimal_bytes(value);
    out.push(247 + len as u8);
    out.extend_from_slice(&value.to_be_bytes()[8 - len..]);
}

/// Reads one varu64 from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), DecodeVaru64Error> {
    let first = *bytes.first().ok_or(DecodeVaru64Error::UnexpectedEof)?;

    if first < 248 {
        return Ok((first as u64, 1));
    }

    let len = (first - 247) as usize;
    if bytes.len() < 1 + len {
        return Err(DecodeVaru64Error::UnexpectedEof);
    }

    let mut value: u64 = 0;
    for byte in &bytes[1..1 + len] {
        value = value << 8 | *byte as u64;
    }

    // A one-byte continuation below 248 or a leading zero byte would have a
    // shorter valid encoding
    if minimal_bytes(value) != len || (len == 1 && value < 248) {
        return Err(DecodeVaru64Error::NonCanonical);
    }

    Ok((value, 1 + len))
}

fn minimal_bytes(value: u64) -> usize {
    match value {
        0 => 1,
        _ => (8 - value.leading_zeros() as usize / 8).max(1),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{decode, encode, encoding_length, DecodeVaru64Error};

    #[rstest]
    #[case(0, vec![0])]
    #[case(1, vec![1])]
    #[case(247, vec![247])]
    #[case(248, vec![248, 248])]
    #[case(255, vec![248, 255])]
    #[case(256, vec![249, 1, 0])]
    #[case(65_535, vec![249, 255, 255])]
    #[case(65_536, vec![250, 1, 0, 0])]
    #[case(u64::MAX, vec![255, 255, 255, 255, 255, 255, 255, 255, 255])]
    fn round_trips(#[case] value: u64, #[case] expected: Vec<u8>) {
        let mut bytes = Vec::new();
        encode(value, &mut bytes);
        assert_eq!(bytes, expected);
        assert_eq!(encoding_length(value), bytes.len());
        assert_eq!(decode(&bytes), Ok((value, bytes.len())));
    }

    #[test]
    fn ignores_trailing_bytes() {
        assert_eq!(decode(&[42, 1, 2, 3]), Ok((42, 1)));
        assert_eq!(decode(&[249, 1, 0, 99]), Ok((256, 3)));
    }

    #[test]
    fn rejects_short_reads() {
        assert_eq!(decode(&[]), Err(DecodeVaru64Error::UnexpectedEof));
        assert_eq!(decode(&[249, 1]), Err(DecodeVaru64Error::UnexpectedEof));
    }

    #[test]
    fn rejects_padded_encodings() {
        // 5 fits in a single byte
        assert_eq!(decode(&[248, 5]), Err(DecodeVaru64Error::NonCanonical));
        // 256 does not need three bytes
        assert_eq!(
            decode(&[250, 0, 1, 0]),
            Err(DecodeVaru64Error::NonCanonical)
        );
    }
}
