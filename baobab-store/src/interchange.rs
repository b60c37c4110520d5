// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bulk interchange: raw entry import and whole-spool export/import.
use std::fs;
use std::path::Path;

use log::debug;
use serde_bytes::ByteBuf;

use baobab_core::entry::{decode_entry, Entry, Verification};

use crate::error::StoreError;
use crate::options::Options;
use crate::spool::{content_key, from_cbor, to_cbor, Clump, ContentRow, IdentityRow};
use crate::store::Store;

impl Store {
    /// Stores a batch of raw entry binaries.
    ///
    /// Each element is decoded, validated against the predecessors already
    /// stored (edges to missing ancestors are deferred, not failed) and
    /// written. Outcomes are reported per item, preserving input order; one
    /// bad binary does not stop the batch.
    pub fn import_binaries(
        &self,
        binaries: &[Vec<u8>],
        options: &Options,
    ) -> Result<Vec<Result<Entry, StoreError>>, StoreError> {
        let clump = self.clump(&options.clump_id)?;

        let outcomes = binaries
            .iter()
            .map(|bytes| self.import_binary(&clump, bytes, options))
            .collect();
        Ok(outcomes)
    }

    fn import_binary(
        &self,
        clump: &Clump,
        bytes: &[u8],
        options: &Options,
    ) -> Result<Entry, StoreError> {
        let entry = decode_entry(bytes)?;
        let author = entry.author().to_base62();

        if let Verification::Deferred = self.revalidate(clump, &author, &entry)? {
            debug!(
                "imported entry {} of log {} of {} before its predecessors",
                entry.seqnum(),
                entry.log_id(),
                author
            );
        }

        let key = content_key(&author, entry.log_id(), entry.seqnum());
        match clump.get(&key)? {
            Some(row) => match &row.entry {
                // Two entries under one key must be byte-identical, with or
                // without the replace option
                Some(stored) if stored.as_slice() != bytes => Err(StoreError::Conflict),
                Some(_) if !options.replace => Ok(entry),
                _ => {
                    clump.put(
                        &key,
                        &ContentRow {
                            entry: Some(bytes.to_vec()),
                            payload: row.payload,
                        },
                    )?;
                    Ok(entry)
                }
            },
            None => {
                clump.put(
                    &key,
                    &ContentRow {
                        entry: Some(bytes.to_vec()),
                        payload: None,
                    },
                )?;
                Ok(entry)
            }
        }
    }

    /// Serialises the whole spool, every clump plus the identity table,
    /// into CBOR files under `dir`.
    pub fn export_store(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let identities = self.spool().identity_fold()?;
        fs::write(dir.join("identity.cbor"), to_cbor(&identities)?)?;

        for clump_id in self.clumps()? {
            let clump = self.clump(&clump_id)?;
            let rows: Vec<(ByteBuf, ContentRow)> = clump
                .fold()?
                .into_iter()
                .map(|(key, row)| (ByteBuf::from(key), row))
                .collect();

            let clump_dir = dir.join(&clump_id);
            fs::create_dir_all(&clump_dir)?;
            fs::write(clump_dir.join("content.cbor"), to_cbor(&rows)?)?;
        }

        debug!("exported spool to {}", dir.display());
        Ok(())
    }

    /// Re-materialises a spool previously written by [`Store::export_store`]
    /// into this one, overwriting row by row.
    pub fn import_store(&self, dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = dir.as_ref();

        let identities: Vec<(String, IdentityRow)> =
            from_cbor(&fs::read(dir.join("identity.cbor"))?)?;
        for (alias, row) in identities {
            self.spool().identity_put(&alias, &row)?;
        }

        for dirent in fs::read_dir(dir)? {
            let dirent = dirent?;
            let content_file = dirent.path().join("content.cbor");
            if !content_file.is_file() {
                continue;
            }
            let clump_id = match dirent.file_name().to_str() {
                Some(name) => name.to_string(),
                None => continue,
            };

            let clump = self.clump(&clump_id)?;
            let rows: Vec<(ByteBuf, ContentRow)> = from_cbor(&fs::read(content_file)?)?;
            for (key, row) in rows {
                clump.put(&key, &row)?;
            }
        }

        debug!("imported spool from {}", dir.display());
        Ok(())
    }
}
