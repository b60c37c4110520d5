// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

use crate::hash::HashError;
use crate::identity::IdentityError;
use crate::varu64::DecodeVaru64Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeEntryError {
    /// Backlink and lipmaa link presence must follow the sequence number.
    #[error("backlink and lipmaa link not valid for this sequence number")]
    InvalidLinks,

    /// Payloads above the size cap are refused at signing time.
    #[error("payload of {0} bytes exceeds the maximum payload size")]
    PayloadTooLarge(u64),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeEntryError {
    /// Input ended in the middle of a field.
    #[error("unexpected end of input while decoding entry")]
    UnexpectedEof,

    /// Only the `0x00` entry variant is defined.
    #[error("unknown entry tag {0:#04x}")]
    UnknownTag(u8),

    /// Sequence numbers start at 1.
    #[error("sequence number must be at least 1")]
    ZeroSeqNum,

    /// A varint field could not be decoded.
    #[error(transparent)]
    Varu64(#[from] DecodeVaru64Error),

    /// A link or payload hash could not be decoded.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Author or signature bytes were rejected.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidateEntryError {
    /// Payload bytes do not hash to the claimed payload hash.
    #[error("payload does not match the hash claimed by the entry")]
    PayloadHashMismatch,

    /// Payload length differs from the claimed size.
    #[error("payload size of {0} bytes does not match claimed size of {1} bytes")]
    PayloadSizeMismatch(u64, u64),

    /// Ed25519 verification against the embedded author failed.
    #[error("signature does not match the claimed author")]
    SignatureMismatch,

    /// The stored predecessor hashes to something else.
    #[error("backlink does not match the entry at the preceding sequence number")]
    BacklinkMismatch,

    /// The stored skip-link target hashes to something else.
    #[error("lipmaa link does not match the entry at the skip-link position")]
    LipmaalinkMismatch,
}
