// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use crate::entry::{
    decode_entry, encode_entry, sign_entry, validate_entry, validate_links, validate_payload,
    validate_signature, DecodeEntryError, Entry, ValidateEntryError, Verification,
};
use crate::hash::YamfHash;
use crate::identity::PrivateKey;
use crate::lipmaa::{is_lipmaa_required, lipmaa};

/// Appends `count` signed entries to a fresh log and returns them together
/// with their canonical bytes, indexed by sequence number.
fn build_log(private_key: &PrivateKey, count: u64) -> HashMap<u64, (Entry, Vec<u8>)> {
    let mut log = HashMap::new();

    for seqnum in 1..=count {
        let backlink = match seqnum > 1 {
            true => {
                let (_, bytes) = &log[&(seqnum - 1)];
                Some(YamfHash::new(bytes))
            }
            false => None,
        };
        let lipmaalink = match is_lipmaa_required(seqnum) {
            true => {
                let (_, bytes) = &log[&lipmaa(seqnum)];
                Some(YamfHash::new(bytes))
            }
            false => None,
        };

        let payload = format!("Entry: {seqnum}");
        let entry = sign_entry(
            private_key,
            0,
            seqnum,
            lipmaalink,
            backlink,
            payload.as_bytes(),
        )
        .unwrap();
        let bytes = encode_entry(&entry).unwrap();
        log.insert(seqnum, (entry, bytes));
    }

    log
}

#[test]
fn round_trip() {
    let log = build_log(&PrivateKey::new(), 14);

    for (entry, bytes) in log.values() {
        let decoded = decode_entry(bytes).unwrap();

        // The byte stream carries everything but the payload
        assert_eq!(&decoded, &entry.clone().with_payload(None));
        assert_eq!(&encode_entry(&decoded).unwrap(), bytes);
    }
}

#[test]
fn first_entry_fields() {
    let entry = sign_entry(&PrivateKey::new(), 0, 1, None, None, b"An entry for testing").unwrap();

    assert_eq!(entry.tag(), 0x00);
    assert_eq!(entry.log_id(), 0);
    assert_eq!(entry.seqnum(), 1);
    assert_eq!(entry.payload_size(), 20);
    assert!(entry.backlink().is_none());
    assert!(entry.lipmaalink().is_none());
    assert!(validate_entry(&entry, |_| None).is_ok());
}

#[test]
fn hash_chain_holds() {
    let log = build_log(&PrivateKey::new(), 14);
    let lookup = |seqnum: u64| log.get(&seqnum).map(|(_, bytes)| bytes.clone());

    for (entry, _) in log.values() {
        assert_eq!(validate_links(entry, lookup), Ok(Verification::Complete));
        assert!(validate_signature(entry).is_ok());
    }

    // Spot-check the raw invariants as well
    let (entry, _) = &log[&5];
    let (_, bytes_of_4) = &log[&4];
    assert_eq!(entry.backlink(), Some(&YamfHash::new(bytes_of_4)));

    let (entry, _) = &log[&13];
    let (_, bytes_of_4) = &log[&4];
    assert_eq!(entry.lipmaalink(), Some(&YamfHash::new(bytes_of_4)));
}

#[test]
fn missing_predecessors_defer() {
    let log = build_log(&PrivateKey::new(), 13);
    let (entry, _) = &log[&13];

    // Without the skip-link target the entry is accepted but not certified
    let only_backlink = |seqnum: u64| match seqnum {
        12 => log.get(&12).map(|(_, bytes)| bytes.clone()),
        _ => None,
    };
    assert_eq!(
        validate_links(entry, only_backlink),
        Ok(Verification::Deferred)
    );
    assert_eq!(validate_links(entry, |_| None), Ok(Verification::Deferred));
}

#[test]
fn detects_link_mismatch() {
    let private_key = PrivateKey::new();
    let log = build_log(&private_key, 4);
    let (entry, _) = &log[&4];

    let forged = encode_entry(&sign_entry(&private_key, 0, 1, None, None, b"forged").unwrap());
    let forged_bytes = forged.unwrap();

    assert_eq!(
        validate_links(entry, |seqnum| match seqnum {
            3 => Some(forged_bytes.clone()),
            _ => None,
        }),
        Err(ValidateEntryError::BacklinkMismatch)
    );
    assert_eq!(
        validate_links(entry, |seqnum| match seqnum {
            1 => Some(forged_bytes.clone()),
            _ => None,
        }),
        Err(ValidateEntryError::LipmaalinkMismatch)
    );
}

#[test]
fn detects_tampered_signature() {
    let entry = sign_entry(&PrivateKey::new(), 0, 1, None, None, b"payload").unwrap();
    let mut bytes = encode_entry(&entry).unwrap();

    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    let tampered = decode_entry(&bytes).unwrap();
    assert_eq!(
        validate_signature(&tampered),
        Err(ValidateEntryError::SignatureMismatch)
    );
}

#[test]
fn detects_payload_mismatch() {
    let entry = sign_entry(&PrivateKey::new(), 0, 1, None, None, b"payload").unwrap();

    assert_eq!(
        validate_payload(&entry, b"other payload"),
        Err(ValidateEntryError::PayloadHashMismatch)
    );
    assert!(validate_payload(&entry, b"payload").is_ok());
}

#[test]
fn decode_rejects_malformed_input() {
    let entry = sign_entry(&PrivateKey::new(), 0, 1, None, None, b"payload").unwrap();
    let bytes = encode_entry(&entry).unwrap();

    assert_eq!(decode_entry(&[]), Err(DecodeEntryError::UnexpectedEof));
    assert_eq!(
        decode_entry(&bytes[..bytes.len() - 1]),
        Err(DecodeEntryError::UnexpectedEof)
    );
    assert_eq!(decode_entry(&bytes[..10]), Err(DecodeEntryError::UnexpectedEof));

    let mut wrong_tag = bytes.clone();
    wrong_tag[0] = 0x01;
    assert_eq!(decode_entry(&wrong_tag), Err(DecodeEntryError::UnknownTag(1)));
}

#[test]
fn decode_ignores_trailing_bytes() {
    let entry = sign_entry(&PrivateKey::new(), 0, 1, None, None, b"payload").unwrap();
    let mut bytes = encode_entry(&entry).unwrap();
    bytes.extend_from_slice(b"payload");

    let decoded = decode_entry(&bytes).unwrap();
    assert_eq!(decoded, entry.with_payload(None));
}
