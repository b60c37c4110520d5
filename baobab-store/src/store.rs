// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use baobab_core::entry::Entry;

use crate::error::StoreError;
use crate::spool::{parse_content_key, Clump, Spool};

/// Handle over a spool directory.
///
/// All state lives under the directory given to [`Store::open`]; there is no
/// process-global configuration. Databases are opened on first use and stay
/// open for the lifetime of the handle.
pub struct Store {
    spool: Spool,
    dir: PathBuf,
}

/// A retrieved entry, shaped by [`crate::Format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredEntry {
    /// Decoded structure, carrying its payload when one is stored.
    Entry(Entry),

    /// Raw canonical bytes.
    Binary(Vec<u8>),
}

impl StoredEntry {
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Binary(_) => None,
        }
    }

    pub fn into_entry(self) -> Option<Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Binary(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Entry(_) => None,
            Self::Binary(bytes) => Some(bytes),
        }
    }
}

impl Store {
    /// Opens (creating if necessary) the spool under `spool_dir`.
    pub fn open(spool_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = spool_dir.as_ref().to_path_buf();
        let spool = Spool::open(&dir)?;
        Ok(Self { spool, dir })
    }

    /// Directory this store was opened on.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clump partitions present under the spool directory.
    pub fn clumps(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.spool.clump_ids()?)
    }

    /// One `(author, log_id, max_seqnum)` triple per stored log, sorted.
    pub fn stored_info(&self, clump_id: &str) -> Result<Vec<(String, u64, u64)>, StoreError> {
        let clump = self.clump(clump_id)?;

        let mut heights: BTreeMap<(String, u64), u64> = BTreeMap::new();
        for (key, row) in clump.fold()? {
            if row.entry.is_none() {
                continue;
            }
            if let Some((author, log_id, seqnum)) = parse_content_key(&key) {
                let height = heights.entry((author, log_id)).or_insert(0);
                *height = (*height).max(seqnum);
            }
        }

        Ok(heights
            .into_iter()
            .map(|((author, log_id), height)| (author, log_id, height))
            .collect())
    }

    pub(crate) fn clump(&self, clump_id: &str) -> Result<Rc<Clump>, StoreError> {
        if clump_id.is_empty() {
            return Err(StoreError::ImproperArguments(
                "clump_id must be a non-empty string".to_string(),
            ));
        }
        Ok(self.spool.clump(clump_id)?)
    }

    pub(crate) fn spool(&self) -> &Spool {
        &self.spool
    }
}
