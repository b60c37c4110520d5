// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::hash::YamfHash;
use crate::identity::{PrivateKey, Signature};
use crate::lipmaa::is_lipmaa_required;
use crate::varu64;

use super::entry::{validate_link_shape, Entry, ENTRY_TAG, MAX_PAYLOAD_SIZE};
use super::error::EncodeEntryError;

/// Produces the canonical byte stream of an entry.
///
/// Fields are concatenated in wire order with optional links simply absent;
/// the payload is never part of the stream. These are the bytes which get
/// hashed when the entry is used as a link target.
pub fn encode_entry(entry: &Entry) -> Result<Vec<u8>, EncodeEntryError> {
    validate_link_shape(
        entry.seqnum(),
        entry.backlink().is_some(),
        entry.lipmaalink().is_some(),
    )?;

    Ok(encode_with_signature(entry, &entry.signature().to_bytes()))
}

/// The signing preimage: canonical bytes with the signature zeroed.
pub fn signable_bytes(entry: &Entry) -> Vec<u8> {
    encode_with_signature(entry, &[0u8; 64])
}

fn encode_with_signature(entry: &Entry, sig: &[u8; 64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(322);

    bytes.push(ENTRY_TAG);
    bytes.extend_from_slice(entry.author().as_bytes());
    varu64::encode(entry.log_id(), &mut bytes);
    varu64::encode(entry.seqnum(), &mut bytes);
    if let Some(lipmaalink) = entry.lipmaalink() {
        lipmaalink.encode_write(&mut bytes);
    }
    if let Some(backlink) = entry.backlink() {
        backlink.encode_write(&mut bytes);
    }
    varu64::encode(entry.payload_size(), &mut bytes);
    entry.payload_hash().encode_write(&mut bytes);
    bytes.extend_from_slice(sig);

    bytes
}

/// Builds and signs a new entry over `payload`.
///
/// Link hashes for anything but the first entry are the caller's to provide,
/// since they require access to the already-stored predecessors. The lipmaa link
/// must be given exactly when [`is_lipmaa_required`] says so.
pub fn sign_entry(
    private_key: &PrivateKey,
    log_id: u64,
    seqnum: u64,
    lipmaalink: Option<YamfHash>,
    backlink: Option<YamfHash>,
    payload: &[u8],
) -> Result<Entry, EncodeEntryError> {
    if payload.len() as u64 > MAX_PAYLOAD_SIZE {
        return Err(EncodeEntryError::PayloadTooLarge(payload.len() as u64));
    }

    let mut entry = Entry::from_parts(
        private_key.public_key(),
        log_id,
        seqnum,
        lipmaalink,
        backlink,
        payload.len() as u64,
        YamfHash::new(payload),
        Signature::placeholder(),
        Some(payload.to_vec()),
    )?;

    let sig = private_key.sign(&signable_bytes(&entry));
    entry.replace_signature(sig);
    Ok(entry)
}
