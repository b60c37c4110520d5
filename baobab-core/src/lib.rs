// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core data types for [`Bamboo`] append-only logs.
//!
//! Bamboo entries are organised in distributed, single-writer append-only
//! logs, created and signed by holders of Ed25519 private keys. Every entry
//! is chained to its direct predecessor (backlink) and to a skip-link
//! predecessor (lipmaa link), which gives logarithmic-length certificate
//! paths from any entry back to the start of its log.
//!
//! This crate contains everything which is independent of persistence: the
//! entry data model and its canonical binary codec, varu64 integer encoding,
//! YAMF hashing, lipmaa link arithmetic, identity primitives and the entry
//! validator. The local spool lives in `baobab-store`.
//!
//! [`Bamboo`]: https://github.com/AljoschaMeyer/bamboo
pub mod entry;
pub mod hash;
pub mod identity;
pub mod lipmaa;
pub mod varu64;

pub use entry::{
    decode_entry, encode_entry, sign_entry, signable_bytes, validate_entry, validate_links,
    validate_payload, validate_signature, DecodeEntryError, EncodeEntryError, Entry,
    ValidateEntryError, Verification, ENTRY_TAG, MAX_PAYLOAD_SIZE,
};
pub use hash::{HashError, YamfHash, YAMF_HASH_LEN};
pub use identity::{base62, IdentityError, PrivateKey, PublicKey, Signature};
pub use lipmaa::{cert_pool, is_lipmaa_required, lipmaa};
