// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ed25519 identity primitives.
//!
//! Authors are identified by their Ed25519 public key. The canonical public
//! identifier is the Base62 encoding of the 32 key bytes, left-padded to 43
//! characters.
use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

/// Length of Ed25519 keys (both halves) in bytes.
pub const KEY_LEN: usize = 32;

/// Length of Ed25519 signatures in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Error types for identity primitives.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    /// Key bytes have an invalid length.
    #[error("invalid key length {0} bytes, expected {1} bytes")]
    InvalidKeyLength(usize, usize),

    /// Signature bytes have an invalid length.
    #[error("invalid signature length {0} bytes, expected {1} bytes")]
    InvalidSignatureLength(usize, usize),

    /// The bytes do not describe a valid curve point.
    #[error("bytes do not form a valid ed25519 public key")]
    InvalidPublicKey,

    /// A Base62 identifier could not be decoded.
    #[error(transparent)]
    Base62(#[from] base62::Base62Error),
}

/// Private ed25519 key used for signing entries.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generates a new private key using the system CSPRNG as a seed.
    pub fn new() -> Self {
        let mut csprng: OsRng = OsRng;
        Self(SigningKey::generate(&mut csprng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        let secret: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidKeyLength(bytes.len(), KEY_LEN))?;
        Ok(Self(SigningKey::from_bytes(&secret)))
    }

    pub fn to_bytes(&self) -> [u8; KEY_LEN] {
        self.0.to_bytes()
    }

    /// Derives the public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, bytes: &[u8]) -> Signature {
        Signature(self.0.sign(bytes).to_bytes())
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material
        write!(f, "PrivateKey(<secret>)")
    }
}

/// Public ed25519 key identifying the author of a log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    /// Validates the bytes as a curve point and wraps them.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidKeyLength(bytes.len(), KEY_LEN))?;
        VerifyingKey::from_bytes(&key).map_err(|_| IdentityError::InvalidPublicKey)?;
        Ok(Self(key))
    }

    pub fn to_bytes(&self) -> [u8; KEY_LEN] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Checks `signature` over `bytes` against this key.
    pub fn verify(&self, bytes: &[u8], signature: &Signature) -> bool {
        match VerifyingKey::from_bytes(&self.0) {
            Ok(key) => key
                .verify(bytes, &ed25519_dalek::Signature::from_bytes(&signature.0))
                .is_ok(),
            Err(_) => false,
        }
    }

    /// The canonical 43-character Base62 identifier.
    pub fn to_base62(&self) -> String {
        base62::encode_key(&self.0)
    }

    pub fn from_base62(identifier: &str) -> Result<Self, IdentityError> {
        let bytes = base62::decode_key(identifier)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base62())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base62())
    }
}

/// Ed25519 signature over an entry's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    /// All-zero signature, occupying the signature's position in the byte
    /// stream while the signing preimage is built.
    pub fn placeholder() -> Self {
        Self([0u8; SIGNATURE_LEN])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        let signature: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidSignatureLength(bytes.len(), SIGNATURE_LEN))?;
        Ok(Self(signature))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.0)[..8])
    }
}

pub mod base62 {
    //! Base62 identifier encoding.
    //!
    //! Key identifiers are always 43 characters: the Base62 expansion of 32
    //! bytes, left-padded with the zero digit so that keys with leading zero
    //! bytes keep a fixed width.
    use thiserror::Error;

    pub const ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    /// Width of an encoded 32-byte key.
    pub const KEY_CHARS: usize = 43;

    #[derive(Error, Debug, PartialEq, Eq)]
    pub enum Base62Error {
        #[error("invalid base62 identifier length {0} characters, expected {1}")]
        InvalidLength(usize, usize),

        #[error("string contains characters outside the base62 alphabet")]
        InvalidCharacter,

        #[error("identifier decodes to more than 32 bytes")]
        Overflow,
    }

    /// Plain Base62 expansion without padding.
    pub fn encode(bytes: &[u8]) -> String {
        base_x::encode(ALPHABET, bytes)
    }

    /// Fixed-width encoding of a 32-byte key.
    pub fn encode_key(key: &[u8; 32]) -> String {
        let encoded = encode(key);
        let mut padded = String::with_capacity(KEY_CHARS);
        for _ in encoded.len()..KEY_CHARS {
            padded.push('0');
        }
        padded.push_str(&encoded);
        padded
    }

    /// Decodes a fixed-width key identifier back into 32 bytes.
    pub fn decode_key(identifier: &str) -> Result<[u8; 32], Base62Error> {
        if identifier.len() != KEY_CHARS {
            return Err(Base62Error::InvalidLength(identifier.len(), KEY_CHARS));
        }

        let bytes =
            base_x::decode(ALPHABET, identifier).map_err(|_| Base62Error::InvalidCharacter)?;

        // Leading pad characters decode to zero bytes; normalise to the
        // numeric value before restoring the fixed key width
        let value = match bytes.iter().position(|byte| *byte != 0) {
            Some(first) => &bytes[first..],
            None => &[],
        };
        if value.len() > 32 {
            return Err(Base62Error::Overflow);
        }
        let mut key = [0u8; 32];
        key[32 - value.len()..].copy_from_slice(value);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{base62, PrivateKey, PublicKey, KEY_LEN, SIGNATURE_LEN};

    #[test]
    fn signing_and_verifying() {
        let private_key = PrivateKey::new();
        let public_key = private_key.public_key();
        let signature = private_key.sign(b"hello, sloth");

        assert!(public_key.verify(b"hello, sloth", &signature));
        assert!(!public_key.verify(b"hello, moth", &signature));
        assert!(!PrivateKey::new().public_key().verify(b"hello, sloth", &signature));
    }

    #[test]
    fn key_lengths() {
        let private_key = PrivateKey::new();
        assert_eq!(private_key.to_bytes().len(), KEY_LEN);
        assert_eq!(private_key.public_key().to_bytes().len(), KEY_LEN);
        assert_eq!(private_key.sign(b"x").to_bytes().len(), SIGNATURE_LEN);
    }

    #[test]
    fn deterministic_public_key() {
        let private_key = PrivateKey::new();
        let again = PrivateKey::from_bytes(&private_key.to_bytes()).unwrap();
        assert_eq!(private_key.public_key(), again.public_key());
    }

    #[test]
    fn base62_identifiers() {
        let public_key = PrivateKey::new().public_key();
        let identifier = public_key.to_base62();

        assert_eq!(identifier.len(), base62::KEY_CHARS);
        assert_eq!(PublicKey::from_base62(&identifier).unwrap(), public_key);
    }

    #[test]
    fn base62_pads_leading_zeros() {
        let mut key = [0u8; 32];
        key[31] = 7;
        let identifier = base62::encode_key(&key);

        assert_eq!(identifier.len(), base62::KEY_CHARS);
        assert!(identifier.starts_with("00"));
        assert_eq!(base62::decode_key(&identifier).unwrap(), key);
    }

    #[test]
    fn base62_rejects_junk() {
        assert!(base62::decode_key("too-short").is_err());
        assert!(base62::decode_key(&"!".repeat(43)).is_err());
    }
}
