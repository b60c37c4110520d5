// SPDX-License-Identifier: AGPL-3.0-or-later

//! The log engine: append, retrieval, compaction and purge.
use std::collections::BTreeSet;

use log::debug;

use baobab_core::entry::{
    decode_entry, encode_entry, sign_entry, validate_entry, Entry, Verification,
};
use baobab_core::hash::YamfHash;
use baobab_core::lipmaa::{cert_pool, is_lipmaa_required, lipmaa};

use crate::error::StoreError;
use crate::options::{Format, Options, Scope};
use crate::spool::{content_key, parse_content_key, Clump, ContentRow};
use crate::store::{Store, StoredEntry};

impl Store {
    /// Signs `payload` as the next entry of the author's log and stores it.
    ///
    /// The author alias is resolved through the identity registry, the next
    /// sequence number is derived from what is already stored, and the link
    /// hashes are taken from the stored predecessors. A missing predecessor
    /// makes the chain unbuildable and fails with [`StoreError::BrokenChain`].
    pub fn append(
        &self,
        payload: &[u8],
        author_alias: &str,
        options: &Options,
    ) -> Result<Entry, StoreError> {
        let private_key = self.signing_key(author_alias)?;
        let author = private_key.public_key().to_base62();
        let clump = self.clump(&options.clump_id)?;

        let seqnum = match self.stored_seqnums(&clump, &author, options.log_id)?.last() {
            Some(max) => max + 1,
            None => 1,
        };

        let backlink = match seqnum > 1 {
            true => {
                let bytes = self
                    .entry_bytes(&clump, &author, options.log_id, seqnum - 1)?
                    .ok_or(StoreError::BrokenChain(seqnum - 1))?;
                Some(YamfHash::new(bytes))
            }
            false => None,
        };
        let lipmaalink = match is_lipmaa_required(seqnum) {
            true => {
                let target = lipmaa(seqnum);
                let bytes = self
                    .entry_bytes(&clump, &author, options.log_id, target)?
                    .ok_or(StoreError::BrokenChain(target))?;
                Some(YamfHash::new(bytes))
            }
            false => None,
        };

        let entry = sign_entry(
            &private_key,
            options.log_id,
            seqnum,
            lipmaalink,
            backlink,
            payload,
        )?;
        let bytes = encode_entry(&entry)?;

        debug!(
            "appending entry {} to log {} of {} in clump {}",
            seqnum, options.log_id, author, options.clump_id
        );
        clump.put(
            &content_key(&author, options.log_id, seqnum),
            &ContentRow {
                entry: Some(bytes),
                payload: Some(payload.to_vec()),
            },
        )?;

        Ok(entry)
    }

    /// Fetches the entry at `seqnum`, shaped by `options.format`.
    ///
    /// With `options.revalidate` the validator is re-run against the stored
    /// payload and the locally available predecessors before anything is
    /// returned.
    pub fn log_entry(
        &self,
        author: &str,
        seqnum: u64,
        options: &Options,
    ) -> Result<StoredEntry, StoreError> {
        let author = self.resolve(author)?;
        let clump = self.clump(&options.clump_id)?;

        let row = clump
            .get(&content_key(&author, options.log_id, seqnum))?
            .ok_or(StoreError::NotFound)?;
        let bytes = row.entry.ok_or(StoreError::NotFound)?;

        if options.revalidate {
            let entry = decode_entry(&bytes)?.with_payload(row.payload.clone());
            self.revalidate(&clump, &author, &entry)?;
        }

        match options.format {
            Format::Binary => Ok(StoredEntry::Binary(bytes)),
            Format::Entry => Ok(StoredEntry::Entry(
                decode_entry(&bytes)?.with_payload(row.payload),
            )),
        }
    }

    /// Greatest stored sequence number of the log, or 0 when empty.
    pub fn max_seqnum(&self, author: &str, options: &Options) -> Result<u64, StoreError> {
        Ok(self.all_seqnums(author, options)?.last().copied().unwrap_or(0))
    }

    /// Every stored sequence number of the log, ascending.
    pub fn all_seqnums(&self, author: &str, options: &Options) -> Result<Vec<u64>, StoreError> {
        let author = self.resolve(author)?;
        let clump = self.clump(&options.clump_id)?;
        self.stored_seqnums(&clump, &author, options.log_id)
    }

    /// The entries of the certificate pool of `seqnum` which are stored,
    /// ascending.
    pub fn log_at(
        &self,
        author: &str,
        seqnum: u64,
        options: &Options,
    ) -> Result<Vec<StoredEntry>, StoreError> {
        let pool = self.certificate_pool(author, seqnum, options)?;
        pool.iter()
            .rev()
            .map(|seqnum| self.log_entry(author, *seqnum, options))
            .collect()
    }

    /// The stored entries with sequence numbers in `[first, last]`, ascending.
    pub fn log_range(
        &self,
        author: &str,
        range: (u64, u64),
        options: &Options,
    ) -> Result<Vec<StoredEntry>, StoreError> {
        let (first, last) = range;
        if first < 2 || last < first {
            return Err(StoreError::ImproperRange);
        }

        self.all_seqnums(author, options)?
            .into_iter()
            .filter(|seqnum| (first..=last).contains(seqnum))
            .map(|seqnum| self.log_entry(author, seqnum, options))
            .collect()
    }

    /// Every stored entry of the log from 1 to `max_seqnum`, ascending.
    pub fn full_log(&self, author: &str, options: &Options) -> Result<Vec<StoredEntry>, StoreError> {
        self.all_seqnums(author, options)?
            .into_iter()
            .map(|seqnum| self.log_entry(author, seqnum, options))
            .collect()
    }

    /// The certificate pool of `seqnum`, restricted to what is stored and to
    /// the current log height, descending.
    pub fn certificate_pool(
        &self,
        author: &str,
        seqnum: u64,
        options: &Options,
    ) -> Result<Vec<u64>, StoreError> {
        let stored: BTreeSet<u64> = self.all_seqnums(author, options)?.into_iter().collect();
        let max = stored.iter().next_back().copied().unwrap_or(0);

        Ok(cert_pool(seqnum)
            .into_iter()
            .filter(|seqnum| *seqnum <= max && stored.contains(seqnum))
            .collect())
    }

    /// Drops every entry outside the certificate pool of the latest one.
    ///
    /// Returns the deleted sequence numbers, ascending. The remaining log
    /// still certifies its newest entry all the way back to the root.
    pub fn compact(&self, author: &str, options: &Options) -> Result<Vec<u64>, StoreError> {
        let resolved = self.resolve(author)?;
        let clump = self.clump(&options.clump_id)?;

        let seqnums = self.stored_seqnums(&clump, &resolved, options.log_id)?;
        let last = match seqnums.last() {
            Some(last) => *last,
            None => return Ok(Vec::new()),
        };

        let keep: BTreeSet<u64> = self
            .certificate_pool(&resolved, last, options)?
            .into_iter()
            .collect();
        let doomed: Vec<u64> = seqnums
            .into_iter()
            .filter(|seqnum| !keep.contains(seqnum))
            .collect();

        let keys: Vec<Vec<u8>> = doomed
            .iter()
            .map(|seqnum| content_key(&resolved, options.log_id, *seqnum))
            .collect();
        clump.delete_many(&keys)?;

        debug!(
            "compacted log {} of {} down to {} entries",
            options.log_id,
            resolved,
            keep.len()
        );
        Ok(doomed)
    }

    /// Deletes content rows by author and log id scope, then reports what is
    /// left via [`Store::stored_info`].
    pub fn purge(
        &self,
        author: Scope<&str>,
        log_id: Scope<u64>,
        clump_id: &str,
    ) -> Result<Vec<(String, u64, u64)>, StoreError> {
        let clump = self.clump(clump_id)?;

        let removed = match (author, log_id) {
            (Scope::All, Scope::All) => {
                clump.truncate()?;
                debug!("truncated content table of clump {}", clump_id);
                0
            }
            (Scope::All, Scope::Specific(log_id)) => clump.match_delete(|key| {
                parse_content_key(key)
                    .map(|(_, stored_log_id, _)| stored_log_id == log_id)
                    .unwrap_or(false)
            })?,
            (Scope::Specific(author), Scope::All) => {
                let author = self.resolve(author)?;
                clump.match_delete(|key| key.starts_with(author.as_bytes()))?
            }
            (Scope::Specific(author), Scope::Specific(log_id)) => {
                let author = self.resolve(author)?;
                let mut prefix = author.into_bytes();
                prefix.extend_from_slice(&log_id.to_be_bytes());
                clump.match_delete(|key| key.starts_with(&prefix))?
            }
        };

        if removed > 0 {
            debug!("purged {} rows from clump {}", removed, clump_id);
        }
        self.stored_info(clump_id)
    }

    /// Deletes the payload half of a row, keeping the verifiable entry.
    ///
    /// Returns `true` when a payload was present and removed.
    pub fn drop_payload(
        &self,
        author: &str,
        seqnum: u64,
        options: &Options,
    ) -> Result<bool, StoreError> {
        let author = self.resolve(author)?;
        let clump = self.clump(&options.clump_id)?;
        let key = content_key(&author, options.log_id, seqnum);

        let row = clump.get(&key)?.ok_or(StoreError::NotFound)?;
        if row.entry.is_none() {
            return Err(StoreError::NotFound);
        }
        if row.payload.is_none() {
            return Ok(false);
        }

        clump.put(
            &key,
            &ContentRow {
                entry: row.entry,
                payload: None,
            },
        )?;
        Ok(true)
    }

    /// Canonical bytes of a stored entry, `None` when the row or its entry
    /// half is absent.
    pub(crate) fn entry_bytes(
        &self,
        clump: &Clump,
        author: &str,
        log_id: u64,
        seqnum: u64,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(clump
            .get(&content_key(author, log_id, seqnum))?
            .and_then(|row| row.entry))
    }

    /// Sequence numbers with a stored entry half, ascending.
    fn stored_seqnums(
        &self,
        clump: &Clump,
        author: &str,
        log_id: u64,
    ) -> Result<Vec<u64>, StoreError> {
        let lo = content_key(author, log_id, 0);
        let hi = content_key(author, log_id, u64::MAX);

        Ok(clump
            .match_range(&lo, &hi)?
            .into_iter()
            .filter(|(_, row)| row.entry.is_some())
            .filter_map(|(key, _)| parse_content_key(&key).map(|(_, _, seqnum)| seqnum))
            .collect())
    }

    /// Runs the validator against stored state, for retrieval and import.
    ///
    /// Predecessors are looked up under the log id the entry itself claims.
    pub(crate) fn revalidate(
        &self,
        clump: &Clump,
        author: &str,
        entry: &Entry,
    ) -> Result<Verification, StoreError> {
        let backlink_bytes = match entry.seqnum() > 1 {
            true => self.entry_bytes(clump, author, entry.log_id(), entry.seqnum() - 1)?,
            false => None,
        };
        let lipmaa_bytes = match entry.is_lipmaalink_required() {
            true => self.entry_bytes(clump, author, entry.log_id(), lipmaa(entry.seqnum()))?,
            false => None,
        };

        let verification = validate_entry(entry, |seqnum| {
            if entry.seqnum() > 1 && seqnum == entry.seqnum() - 1 {
                backlink_bytes.clone()
            } else if seqnum == lipmaa(entry.seqnum()) {
                lipmaa_bytes.clone()
            } else {
                None
            }
        })?;
        Ok(verification)
    }
}
