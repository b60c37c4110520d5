// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::hash::{YamfHash, YAMF_HASH_LEN};
use crate::identity::{PublicKey, Signature};
use crate::lipmaa::is_lipmaa_required;

use super::entry::{Entry, ENTRY_TAG, FIRST_SEQ_NUM};
use super::error::DecodeEntryError;

/// Parses one entry from the front of a canonical byte stream.
///
/// Whether the link fields are present is fully determined by the sequence
/// number, so the parser never guesses: the first entry carries no links, a
/// lipmaa link is read exactly when it cannot coincide with the backlink.
/// Bytes after the signature are ignored; payloads travel separately.
pub fn decode_entry(bytes: &[u8]) -> Result<Entry, DecodeEntryError> {
    let mut cursor = Cursor { bytes, offset: 0 };

    let tag = cursor.take(1)?[0];
    if tag != ENTRY_TAG {
        return Err(DecodeEntryError::UnknownTag(tag));
    }

    let author = PublicKey::from_bytes(cursor.take(32)?)?;
    let log_id = cursor.varu64()?;
    let seqnum = cursor.varu64()?;
    if seqnum < FIRST_SEQ_NUM {
        return Err(DecodeEntryError::ZeroSeqNum);
    }

    let lipmaalink = match is_lipmaa_required(seqnum) {
        true => Some(cursor.yamf_hash()?),
        false => None,
    };
    let backlink = match seqnum > FIRST_SEQ_NUM {
        true => Some(cursor.yamf_hash()?),
        false => None,
    };

    let payload_size = cursor.varu64()?;
    let payload_hash = cursor.yamf_hash()?;
    let sig = Signature::from_bytes(cursor.take(64)?)?;

    let entry = Entry::from_parts(
        author,
        log_id,
        seqnum,
        lipmaalink,
        backlink,
        payload_size,
        payload_hash,
        sig,
        None,
    )
    // The link shape was fixed by the sequence number above
    .expect("links follow the decode rules");

    Ok(entry)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeEntryError> {
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(DecodeEntryError::UnexpectedEof)?;
        self.offset = end;
        Ok(slice)
    }

    fn varu64(&mut self) -> Result<u64, DecodeEntryError> {
        let (value, consumed) = crate::varu64::decode(&self.bytes[self.offset..])?;
        self.offset += consumed;
        Ok(value)
    }

    fn yamf_hash(&mut self) -> Result<YamfHash, DecodeEntryError> {
        let slice = self.take(YAMF_HASH_LEN)?;
        let (hash, _) = YamfHash::decode(slice)?;
        Ok(hash)
    }
}
