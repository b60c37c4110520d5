// SPDX-License-Identifier: AGPL-3.0-or-later

//! Content-addressed local spool for [`Bamboo`] append-only logs.
//!
//! A [`Store`] wraps a spool directory and exposes the log engine on top of
//! it: appending signed entries, retrieving them by sequence number or
//! certificate pool, compaction, purging, bulk interchange and the identity
//! registry. Data is partitioned into named *clumps*, each holding its own
//! content and status tables; identities are global to the spool.
//!
//! ## Example
//!
//! ```no_run
//! use baobab_store::{Options, Store};
//!
//! # fn main() -> Result<(), baobab_store::StoreError> {
//! let store = Store::open("/tmp/spool")?;
//! store.create_identity("testy", None)?;
//!
//! let entry = store.append(b"An entry for testing", "testy", &Options::default())?;
//! assert_eq!(entry.seqnum(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! [`Bamboo`]: https://github.com/AljoschaMeyer/bamboo
mod error;
mod identities;
mod interchange;
mod logs;
mod options;
mod spool;
mod status;
mod store;

pub use error::StoreError;
pub use identities::KeyHalf;
pub use options::{Format, Options, Scope, Table, DEFAULT_CLUMP};
pub use store::{Store, StoredEntry};
