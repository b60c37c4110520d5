// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

use baobab_core::entry::{DecodeEntryError, EncodeEntryError, ValidateEntryError};
use baobab_core::identity::IdentityError;

use crate::spool::SpoolError;

/// Error type of every `Store` operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested entry or identity is not in the spool.
    #[error("entry or identity not found")]
    NotFound,

    /// Append could not load a predecessor required for its links.
    #[error("append requires the entry at sequence number {0}, which is not stored")]
    BrokenChain(u64),

    /// An import would overwrite an entry with different bytes.
    #[error("an entry with the same author, log id and sequence number but different bytes is already stored")]
    Conflict,

    /// Range queries start at 2 and run forwards.
    #[error("log range must satisfy 2 <= first <= last")]
    ImproperRange,

    /// An author reference did not resolve to exactly one identity.
    #[error("identity reference `{0}` does not resolve")]
    UnknownIdentity(String),

    /// Arguments of the wrong shape, length or encoding.
    #[error("improper arguments: {0}")]
    ImproperArguments(String),

    /// Entry bytes could not be decoded.
    #[error(transparent)]
    Malformed(#[from] DecodeEntryError),

    /// A decoded entry failed signature, payload or link verification.
    #[error(transparent)]
    Invalid(#[from] ValidateEntryError),

    /// An entry could not be encoded or signed.
    #[error(transparent)]
    Encode(#[from] EncodeEntryError),

    /// Key or signature material was rejected.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The underlying indexed store failed.
    #[error(transparent)]
    Spool(#[from] SpoolError),

    /// Filesystem access outside the indexed store failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
