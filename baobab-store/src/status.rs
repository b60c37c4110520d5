// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cached digests summarising a table's content.
use blake2::{Blake2s256, Digest};

use baobab_core::base62;

use crate::error::StoreError;
use crate::options::Table;
use crate::spool::to_cbor;
use crate::store::Store;

impl Store {
    /// Base62 digest over all rows of a table.
    ///
    /// The value is cached in the status table and recomputed lazily: every
    /// mutation of the underlying table drops the cached row, so the digest
    /// changes exactly when the table does. `clump_id` picks the partition
    /// for the content table; the identity table is global.
    pub fn current_hash(&self, table: Table, clump_id: &str) -> Result<String, StoreError> {
        match table {
            Table::Identity => {
                if let Some(cached) = self.spool().identity_status()? {
                    return Ok(cached);
                }

                let mut hasher = Blake2s256::new();
                for (alias, row) in self.spool().identity_fold()? {
                    hasher.update(alias.as_bytes());
                    hasher.update(&to_cbor(&row)?);
                }
                let digest = finalize(hasher);

                self.spool().set_identity_status(&digest)?;
                Ok(digest)
            }
            Table::Content => {
                let clump = self.clump(clump_id)?;
                if let Some(cached) = clump.status()? {
                    return Ok(cached);
                }

                let mut hasher = Blake2s256::new();
                for (key, row) in clump.fold()? {
                    hasher.update(&key);
                    hasher.update(&to_cbor(&row)?);
                }
                let digest = finalize(hasher);

                clump.set_status(&digest)?;
                Ok(digest)
            }
        }
    }
}

fn finalize(hasher: Blake2s256) -> String {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    base62::encode(&digest)
}
