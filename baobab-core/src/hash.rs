// SPDX-License-Identifier: AGPL-3.0-or-later

//! YAMF ("Yet-Another-Multi-Format") hashes.
//!
//! All link and payload hashes in Bamboo entries are BLAKE2b-512 digests
//! wrapped in a self-describing two-byte frame: the varu64 hash tag (`0` for
//! BLAKE2b) followed by the varu64 digest length (`64`), 66 bytes in total.
use std::fmt;

use blake2::{Blake2b512, Digest};
use thiserror::Error;

use crate::varu64;

/// Length of the wrapped digest in bytes.
pub const DIGEST_LEN: usize = 64;

/// Length of an encoded yamf-hash in bytes.
pub const YAMF_HASH_LEN: usize = DIGEST_LEN + 2;

/// The varu64 tag announcing a BLAKE2b digest.
const BLAKE2B_TAG: u64 = 0;

/// Error types for `YamfHash`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashError {
    /// Hash bytes have an invalid length.
    #[error("invalid yamf-hash length {0} bytes, expected {1} bytes")]
    InvalidLength(usize, usize),

    /// The hash tag announces an algorithm other than BLAKE2b.
    #[error("unknown yamf-hash tag {0}")]
    UnknownTag(u64),

    /// The announced digest length is not 64 bytes.
    #[error("unsupported yamf-hash digest length {0}")]
    UnsupportedDigestLength(u64),

    /// The tag or length field is not a valid varu64.
    #[error(transparent)]
    Varu64(#[from] varu64::DecodeVaru64Error),
}

/// 66-byte self-describing BLAKE2b-512 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YamfHash([u8; DIGEST_LEN]);

impl YamfHash {
    /// Hashes the given bytes.
    pub fn new(buf: impl AsRef<[u8]>) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(buf.as_ref());

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&hasher.finalize());
        Self(digest)
    }

    /// Wraps a raw 64-byte digest.
    pub const fn from_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self(digest)
    }

    /// The unwrapped digest bytes.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Encoded form: tag, digest length, digest.
    pub fn to_bytes(&self) -> [u8; YAMF_HASH_LEN] {
        let mut bytes = [0u8; YAMF_HASH_LEN];
        bytes[0] = BLAKE2B_TAG as u8;
        bytes[1] = DIGEST_LEN as u8;
        bytes[2..].copy_from_slice(&self.0);
        bytes
    }

    /// Appends the encoded form to `out`.
    pub fn encode_write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }

    /// Reads one yamf-hash from the front of `bytes`.
    ///
    /// Returns the hash and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), HashError> {
        let (tag, tag_len) = varu64::decode(bytes)?;
        if tag != BLAKE2B_TAG {
            return Err(HashError::UnknownTag(tag));
        }

        let (digest_len, len_len) = varu64::decode(&bytes[tag_len..])?;
        if digest_len != DIGEST_LEN as u64 {
            return Err(HashError::UnsupportedDigestLength(digest_len));
        }

        let start = tag_len + len_len;
        let rest = bytes
            .get(start..start + DIGEST_LEN)
            .ok_or(HashError::InvalidLength(bytes.len(), YAMF_HASH_LEN))?;

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(rest);
        Ok((Self(digest), start + DIGEST_LEN))
    }

    /// Hex string of the encoded form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl TryFrom<&[u8]> for YamfHash {
    type Error = HashError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != YAMF_HASH_LEN {
            return Err(HashError::InvalidLength(value.len(), YAMF_HASH_LEN));
        }
        let (hash, _) = Self::decode(value)?;
        Ok(hash)
    }
}

impl fmt::Display for YamfHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for YamfHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Last six hex characters are plenty to tell hashes apart in logs
        let hex = self.to_hex();
        write!(f, "YamfHash({})", &hex[hex.len() - 6..])
    }
}

#[cfg(test)]
mod tests {
    use super::{HashError, YamfHash, YAMF_HASH_LEN};

    #[test]
    fn hashing() {
        let hash = YamfHash::new(b"An entry for testing");
        let bytes = hash.to_bytes();

        assert_eq!(bytes.len(), YAMF_HASH_LEN);
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 64);
        assert_eq!(YamfHash::new(b"An entry for testing"), hash);
        assert_ne!(YamfHash::new(b"another payload"), hash);
    }

    #[test]
    fn decoding() {
        let hash = YamfHash::new([1, 2, 3]);
        let mut bytes = hash.to_bytes().to_vec();
        bytes.extend_from_slice(&[9, 9, 9]);

        let (decoded, consumed) = YamfHash::decode(&bytes).unwrap();
        assert_eq!(decoded, hash);
        assert_eq!(consumed, YAMF_HASH_LEN);
    }

    #[test]
    fn rejects_foreign_tags() {
        let mut bytes = YamfHash::new([1, 2, 3]).to_bytes();
        bytes[0] = 1;
        assert_eq!(YamfHash::decode(&bytes), Err(HashError::UnknownTag(1)));

        let mut bytes = YamfHash::new([1, 2, 3]).to_bytes();
        bytes[1] = 32;
        assert_eq!(
            YamfHash::decode(&bytes),
            Err(HashError::UnsupportedDigestLength(32))
        );
    }

    #[test]
    fn rejects_short_input() {
        let bytes = YamfHash::new([1, 2, 3]).to_bytes();
        assert!(YamfHash::decode(&bytes[..20]).is_err());
        assert!(YamfHash::try_from(&bytes[..65]).is_err());
    }
}
