// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bamboo log entries: data model, canonical codec and verification.
pub mod decode;
pub mod encode;
#[allow(clippy::module_inception)]
mod entry;
pub mod error;
pub mod validate;

pub use decode::decode_entry;
pub use encode::{encode_entry, sign_entry, signable_bytes};
pub use entry::{Entry, ENTRY_TAG, FIRST_SEQ_NUM, MAX_PAYLOAD_SIZE};
pub use error::{DecodeEntryError, EncodeEntryError, ValidateEntryError};
pub use validate::{
    validate_entry, validate_links, validate_payload, validate_signature, Verification,
};

#[cfg(test)]
mod tests;
