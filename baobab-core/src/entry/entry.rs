// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::hash::YamfHash;
use crate::identity::{PublicKey, Signature};
use crate::lipmaa::is_lipmaa_required;

use super::error::EncodeEntryError;

/// The single defined entry variant.
pub const ENTRY_TAG: u8 = 0x00;

/// Start counting entries from here.
pub const FIRST_SEQ_NUM: u64 = 1;

/// Upper bound on payload sizes accepted at signing time.
pub const MAX_PAYLOAD_SIZE: u64 = 16 * 1024 * 1024;

/// Entry of an append-only log based on the [`Bamboo`] specification.
///
/// Entries are organised in single-writer logs, one per `(author, log_id)`
/// pair, and are chained by content hash: `backlink` points at the direct
/// predecessor, `lipmaalink` at the skip-link position `lipmaa(seqnum)`.
/// Either link is omitted from the wire format when redundant: the first
/// entry carries none, and the lipmaa link is dropped whenever it would equal
/// the backlink.
///
/// The payload is off-chain data: the signed header only commits to its hash
/// and size, so payloads can be dropped later without breaking the log's
/// verifiability. An `Entry` therefore may or may not carry its payload.
///
/// [`Bamboo`]: https://github.com/AljoschaMeyer/bamboo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    author: PublicKey,
    log_id: u64,
    seqnum: u64,
    lipmaalink: Option<YamfHash>,
    backlink: Option<YamfHash>,
    payload_size: u64,
    payload_hash: YamfHash,
    sig: Signature,
    payload: Option<Vec<u8>>,
}

impl Entry {
    /// Assembles an entry from already-validated parts.
    ///
    /// The link shape is re-checked; everything else is taken at face value.
    /// Used by the decoder and the signing path.
    pub(crate) fn from_parts(
        author: PublicKey,
        log_id: u64,
        seqnum: u64,
        lipmaalink: Option<YamfHash>,
        backlink: Option<YamfHash>,
        payload_size: u64,
        payload_hash: YamfHash,
        sig: Signature,
        payload: Option<Vec<u8>>,
    ) -> Result<Self, EncodeEntryError> {
        validate_link_shape(seqnum, backlink.is_some(), lipmaalink.is_some())?;

        Ok(Self {
            author,
            log_id,
            seqnum,
            lipmaalink,
            backlink,
            payload_size,
            payload_hash,
            sig,
            payload,
        })
    }

    /// The entry variant tag.
    pub fn tag(&self) -> u8 {
        ENTRY_TAG
    }

    pub fn author(&self) -> &PublicKey {
        &self.author
    }

    pub fn log_id(&self) -> u64 {
        self.log_id
    }

    pub fn seqnum(&self) -> u64 {
        self.seqnum
    }

    /// Hash of the skip-link entry, when one is required.
    pub fn lipmaalink(&self) -> Option<&YamfHash> {
        self.lipmaalink.as_ref()
    }

    /// Hash of the direct predecessor, absent for the first entry.
    pub fn backlink(&self) -> Option<&YamfHash> {
        self.backlink.as_ref()
    }

    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    pub fn payload_hash(&self) -> &YamfHash {
        &self.payload_hash
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Returns true for the first entry of a log.
    pub fn is_first(&self) -> bool {
        self.seqnum == FIRST_SEQ_NUM
    }

    /// Returns true if a distinct lipmaa link is required at this position.
    pub fn is_lipmaalink_required(&self) -> bool {
        is_lipmaa_required(self.seqnum)
    }

    /// Replaces the attached payload, e.g. after fetching it from storage.
    pub fn with_payload(mut self, payload: Option<Vec<u8>>) -> Self {
        self.payload = payload;
        self
    }

    pub(crate) fn replace_signature(&mut self, sig: Signature) {
        self.sig = sig;
    }
}

/// Checks the link presence truth table for a sequence number.
///
/// The first entry carries no links; every other entry carries a backlink
/// and carries a lipmaa link exactly when it differs from the backlink.
pub(crate) fn validate_link_shape(
    seqnum: u64,
    has_backlink: bool,
    has_lipmaalink: bool,
) -> Result<(), EncodeEntryError> {
    match (seqnum == FIRST_SEQ_NUM, has_backlink, has_lipmaalink) {
        (true, false, false) => Ok(()),
        (false, true, lipmaa) if lipmaa == is_lipmaa_required(seqnum) => Ok(()),
        (_, _, _) => Err(EncodeEntryError::InvalidLinks),
    }
}
