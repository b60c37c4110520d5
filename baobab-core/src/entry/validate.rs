// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::hash::YamfHash;
use crate::lipmaa::lipmaa;

use super::encode::signable_bytes;
use super::entry::Entry;
use super::error::ValidateEntryError;

/// Outcome of link verification.
///
/// A mismatch against a locally available predecessor is an error; a missing
/// predecessor is not. The entry is then accepted with `Deferred` standing
/// for "not yet fully certified"; its certificate path completes once the
/// missing ancestors arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Every required link was checked against a stored predecessor.
    Complete,

    /// At least one predecessor was unavailable; its edge is unchecked.
    Deferred,
}

/// Checks that the attached payload matches the signed hash and size.
pub fn validate_payload(entry: &Entry, payload: &[u8]) -> Result<(), ValidateEntryError> {
    if &YamfHash::new(payload) != entry.payload_hash() {
        return Err(ValidateEntryError::PayloadHashMismatch);
    }

    if payload.len() as u64 != entry.payload_size() {
        return Err(ValidateEntryError::PayloadSizeMismatch(
            payload.len() as u64,
            entry.payload_size(),
        ));
    }

    Ok(())
}

/// Checks the entry's signature against its embedded author.
pub fn validate_signature(entry: &Entry) -> Result<(), ValidateEntryError> {
    let preimage = signable_bytes(entry);
    match entry.author().verify(&preimage, entry.signature()) {
        true => Ok(()),
        false => Err(ValidateEntryError::SignatureMismatch),
    }
}

/// Checks the back- and lipmaa link hashes against stored predecessors.
///
/// `lookup` maps a sequence number to the canonical bytes of the stored
/// entry at that position in the same `(author, log_id)` log, or `None` when
/// it is not held locally. Unavailable predecessors defer their edge instead
/// of failing.
pub fn validate_links<F>(entry: &Entry, mut lookup: F) -> Result<Verification, ValidateEntryError>
where
    F: FnMut(u64) -> Option<Vec<u8>>,
{
    if entry.is_first() {
        return Ok(Verification::Complete);
    }

    let mut verification = Verification::Complete;

    match lookup(entry.seqnum() - 1) {
        Some(bytes) => {
            if entry.backlink() != Some(&YamfHash::new(&bytes)) {
                return Err(ValidateEntryError::BacklinkMismatch);
            }
        }
        None => verification = Verification::Deferred,
    }

    if entry.is_lipmaalink_required() {
        match lookup(lipmaa(entry.seqnum())) {
            Some(bytes) => {
                if entry.lipmaalink() != Some(&YamfHash::new(&bytes)) {
                    return Err(ValidateEntryError::LipmaalinkMismatch);
                }
            }
            None => verification = Verification::Deferred,
        }
    }

    Ok(verification)
}

/// Runs every check on a decoded entry.
///
/// The payload check is skipped when the entry carries no payload, so
/// headers remain verifiable after their off-chain data was dropped.
pub fn validate_entry<F>(entry: &Entry, lookup: F) -> Result<Verification, ValidateEntryError>
where
    F: FnMut(u64) -> Option<Vec<u8>>,
{
    if let Some(payload) = entry.payload() {
        validate_payload(entry, payload)?;
    }
    validate_signature(entry)?;
    validate_links(entry, lookup)
}
