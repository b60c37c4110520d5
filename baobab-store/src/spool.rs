// SPDX-License-Identifier: AGPL-3.0-or-later

//! redb plumbing underneath the store.
//!
//! One database file per spool file: `identity.redb` at the spool root (the
//! identity table plus its status row) and `content.redb` / `status.redb`
//! inside every clump directory. Databases are opened lazily
//! and stay open behind the [`crate::Store`] handle.
//!
//! Content rows are keyed by the ordered byte string
//! `base62_author + log_id (BE) + seqnum (BE)`, which turns every pattern
//! match of the log engine into a plain range scan.
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use baobab_core::base62;

const CONTENT_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("content");
const IDENTITY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("identity");
const STATUS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("status");

/// Width of a content key in bytes: Base62 author, log id, seqnum.
const CONTENT_KEY_LEN: usize = base62::KEY_CHARS + 8 + 8;

/// Errors raised by the indexed store underneath the log engine.
#[derive(Error, Debug)]
pub enum SpoolError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("stored value could not be decoded: {0}")]
    Codec(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Value of a content row. Either half may be absent transiently: imports
/// deliver entries without payloads, and payloads can be dropped on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ContentRow {
    #[serde(with = "serde_bytes")]
    pub entry: Option<Vec<u8>>,

    #[serde(with = "serde_bytes")]
    pub payload: Option<Vec<u8>>,
}

/// Value of an identity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IdentityRow {
    pub secret: [u8; 32],
    pub public: [u8; 32],
}

pub(crate) fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SpoolError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|err| SpoolError::Codec(err.to_string()))?;
    Ok(bytes)
}

pub(crate) fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SpoolError> {
    ciborium::de::from_reader(bytes)
        .map_err(|err: ciborium::de::Error<std::io::Error>| SpoolError::Codec(err.to_string()))
}

pub(crate) fn content_key(author: &str, log_id: u64, seqnum: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(CONTENT_KEY_LEN);
    key.extend_from_slice(author.as_bytes());
    key.extend_from_slice(&log_id.to_be_bytes());
    key.extend_from_slice(&seqnum.to_be_bytes());
    key
}

pub(crate) fn parse_content_key(key: &[u8]) -> Option<(String, u64, u64)> {
    if key.len() != CONTENT_KEY_LEN {
        return None;
    }

    let author = std::str::from_utf8(&key[..base62::KEY_CHARS]).ok()?;
    let log_id = u64::from_be_bytes(key[base62::KEY_CHARS..base62::KEY_CHARS + 8].try_into().ok()?);
    let seqnum = u64::from_be_bytes(key[base62::KEY_CHARS + 8..].try_into().ok()?);
    Some((author.to_string(), log_id, seqnum))
}

/// Handle over the spool directory, holding every opened database.
pub(crate) struct Spool {
    dir: PathBuf,
    identity: Database,
    clumps: RefCell<HashMap<String, Rc<Clump>>>,
}

impl Spool {
    pub fn open(dir: &Path) -> Result<Self, SpoolError> {
        fs::create_dir_all(dir)?;
        let identity = Database::create(dir.join("identity.redb"))?;

        // Make sure the tables exist before the first read transaction
        let txn = identity.begin_write()?;
        {
            txn.open_table(IDENTITY_TABLE)?;
            txn.open_table(STATUS_TABLE)?;
        }
        txn.commit()?;

        Ok(Self {
            dir: dir.to_path_buf(),
            identity,
            clumps: RefCell::new(HashMap::new()),
        })
    }

    /// Opens (or returns the already-open) databases of a clump.
    pub fn clump(&self, clump_id: &str) -> Result<Rc<Clump>, SpoolError> {
        if let Some(clump) = self.clumps.borrow().get(clump_id) {
            return Ok(Rc::clone(clump));
        }

        let dir = self.dir.join(clump_id);
        fs::create_dir_all(&dir)?;
        let content = Database::create(dir.join("content.redb"))?;
        let status = Database::create(dir.join("status.redb"))?;

        let txn = content.begin_write()?;
        {
            txn.open_table(CONTENT_TABLE)?;
        }
        txn.commit()?;
        let txn = status.begin_write()?;
        {
            txn.open_table(STATUS_TABLE)?;
        }
        txn.commit()?;

        let clump = Rc::new(Clump { content, status });
        self.clumps
            .borrow_mut()
            .insert(clump_id.to_string(), Rc::clone(&clump));
        Ok(clump)
    }

    /// Every clump present under the spool directory.
    pub fn clump_ids(&self) -> Result<Vec<String>, SpoolError> {
        let mut ids: BTreeSet<String> = self.clumps.borrow().keys().cloned().collect();

        for dirent in fs::read_dir(&self.dir)? {
            let dirent = dirent?;
            if dirent.path().join("content.redb").is_file() {
                if let Some(name) = dirent.file_name().to_str() {
                    ids.insert(name.to_string());
                }
            }
        }

        Ok(ids.into_iter().collect())
    }

    pub fn identity_get(&self, alias: &str) -> Result<Option<IdentityRow>, SpoolError> {
        let txn = self.identity.begin_read()?;
        let table = txn.open_table(IDENTITY_TABLE)?;
        match table.get(alias)? {
            Some(guard) => Ok(Some(from_cbor(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn identity_put(&self, alias: &str, row: &IdentityRow) -> Result<(), SpoolError> {
        let bytes = to_cbor(row)?;
        let txn = self.identity.begin_write()?;
        {
            let mut table = txn.open_table(IDENTITY_TABLE)?;
            table.insert(alias, bytes.as_slice())?;
            let mut status = txn.open_table(STATUS_TABLE)?;
            status.remove("identity")?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn identity_delete(&self, alias: &str) -> Result<bool, SpoolError> {
        let txn = self.identity.begin_write()?;
        let removed = {
            let mut table = txn.open_table(IDENTITY_TABLE)?;
            let removed = table.remove(alias)?.is_some();
            if removed {
                let mut status = txn.open_table(STATUS_TABLE)?;
                status.remove("identity")?;
            }
            removed
        };
        txn.commit()?;
        Ok(removed)
    }

    /// All identities in alias order.
    pub fn identity_fold(&self) -> Result<Vec<(String, IdentityRow)>, SpoolError> {
        let txn = self.identity.begin_read()?;
        let table = txn.open_table(IDENTITY_TABLE)?;

        let mut rows = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            rows.push((key.value().to_string(), from_cbor(value.value())?));
        }
        Ok(rows)
    }

    pub fn identity_status(&self) -> Result<Option<String>, SpoolError> {
        status_get(&self.identity, "identity")
    }

    pub fn set_identity_status(&self, value: &str) -> Result<(), SpoolError> {
        status_put(&self.identity, "identity", value)
    }
}

/// The content and status databases of one clump.
pub(crate) struct Clump {
    content: Database,
    status: Database,
}

impl Clump {
    pub fn get(&self, key: &[u8]) -> Result<Option<ContentRow>, SpoolError> {
        let txn = self.content.begin_read()?;
        let table = txn.open_table(CONTENT_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(from_cbor(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, key: &[u8], row: &ContentRow) -> Result<(), SpoolError> {
        let bytes = to_cbor(row)?;
        let txn = self.content.begin_write()?;
        {
            let mut table = txn.open_table(CONTENT_TABLE)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        self.invalidate_status()
    }

    pub fn delete(&self, key: &[u8]) -> Result<bool, SpoolError> {
        let txn = self.content.begin_write()?;
        let removed = {
            let mut table = txn.open_table(CONTENT_TABLE)?;
            let existed = table.remove(key)?.is_some();
            existed
        };
        txn.commit()?;
        if removed {
            self.invalidate_status()?;
        }
        Ok(removed)
    }

    /// Removes a batch of keys inside a single transaction.
    pub fn delete_many(&self, keys: &[Vec<u8>]) -> Result<usize, SpoolError> {
        let txn = self.content.begin_write()?;
        let mut removed = 0;
        {
            let mut table = txn.open_table(CONTENT_TABLE)?;
            for key in keys {
                if table.remove(key.as_slice())?.is_some() {
                    removed += 1;
                }
            }
        }
        txn.commit()?;
        if removed > 0 {
            self.invalidate_status()?;
        }
        Ok(removed)
    }

    /// Rows whose keys fall in `[lo, hi]`, in key order.
    pub fn match_range(&self, lo: &[u8], hi: &[u8]) -> Result<Vec<(Vec<u8>, ContentRow)>, SpoolError> {
        let txn = self.content.begin_read()?;
        let table = txn.open_table(CONTENT_TABLE)?;

        let mut rows = Vec::new();
        for item in table.range::<&[u8]>(lo..=hi)? {
            let (key, value) = item?;
            rows.push((key.value().to_vec(), from_cbor(value.value())?));
        }
        Ok(rows)
    }

    /// Deletes every row whose key matches the predicate, in one transaction.
    pub fn match_delete<F>(&self, matches: F) -> Result<usize, SpoolError>
    where
        F: Fn(&[u8]) -> bool,
    {
        let txn = self.content.begin_write()?;
        let removed = {
            let mut table = txn.open_table(CONTENT_TABLE)?;
            let doomed: Vec<Vec<u8>> = {
                let mut keys = Vec::new();
                for item in table.iter()? {
                    let (key, _) = item?;
                    if matches(key.value()) {
                        keys.push(key.value().to_vec());
                    }
                }
                keys
            };
            for key in &doomed {
                table.remove(key.as_slice())?;
            }
            doomed.len()
        };
        txn.commit()?;
        if removed > 0 {
            self.invalidate_status()?;
        }
        Ok(removed)
    }

    pub fn truncate(&self) -> Result<(), SpoolError> {
        self.match_delete(|_| true)?;
        // Always reset the digest, even when the table was already empty
        self.invalidate_status()
    }

    /// All rows in key order.
    pub fn fold(&self) -> Result<Vec<(Vec<u8>, ContentRow)>, SpoolError> {
        let txn = self.content.begin_read()?;
        let table = txn.open_table(CONTENT_TABLE)?;

        let mut rows = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            rows.push((key.value().to_vec(), from_cbor(value.value())?));
        }
        Ok(rows)
    }

    pub fn status(&self) -> Result<Option<String>, SpoolError> {
        status_get(&self.status, "content")
    }

    pub fn set_status(&self, value: &str) -> Result<(), SpoolError> {
        status_put(&self.status, "content", value)
    }

    fn invalidate_status(&self) -> Result<(), SpoolError> {
        let txn = self.status.begin_write()?;
        {
            let mut table = txn.open_table(STATUS_TABLE)?;
            table.remove("content")?;
        }
        txn.commit()?;
        Ok(())
    }
}

fn status_get(db: &Database, key: &str) -> Result<Option<String>, SpoolError> {
    let txn = db.begin_read()?;
    let table = txn.open_table(STATUS_TABLE)?;
    Ok(table.get(key)?.map(|guard| guard.value().to_string()))
}

fn status_put(db: &Database, key: &str, value: &str) -> Result<(), SpoolError> {
    let txn = db.begin_write()?;
    {
        let mut table = txn.open_table(STATUS_TABLE)?;
        table.insert(key, value)?;
    }
    txn.commit()?;
    Ok(())
}
