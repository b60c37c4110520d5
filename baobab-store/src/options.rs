// SPDX-License-Identifier: AGPL-3.0-or-later

/// Clump used when the caller does not name one.
pub const DEFAULT_CLUMP: &str = "default";

/// Shape in which retrieved entries are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Decoded [`baobab_core::Entry`] structure, payload attached when stored.
    #[default]
    Entry,

    /// Raw canonical bytes, exactly as stored.
    Binary,
}

/// Either everything, or one particular value.
///
/// Used by purge to widen its author and log id arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<T> {
    All,
    Specific(T),
}

/// Table addressed by [`crate::Store::current_hash`].
///
/// The status table itself is not addressable; its digest is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Content,
    Identity,
}

/// Per-call options, mirrored across every log engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Per-author log discriminator.
    pub log_id: u64,

    /// Clump partition to operate in.
    pub clump_id: String,

    /// Return shape for retrieved entries.
    pub format: Format,

    /// Re-run the validator on every retrieved entry.
    pub revalidate: bool,

    /// Allow import to overwrite an existing row.
    pub replace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_id: 0,
            clump_id: DEFAULT_CLUMP.to_string(),
            format: Format::default(),
            revalidate: false,
            replace: false,
        }
    }
}

impl Options {
    pub fn log_id(mut self, log_id: u64) -> Self {
        self.log_id = log_id;
        self
    }

    pub fn clump_id(mut self, clump_id: impl Into<String>) -> Self {
        self.clump_id = clump_id.into();
        self
    }

    pub fn binary(mut self) -> Self {
        self.format = Format::Binary;
        self
    }

    pub fn revalidate(mut self) -> Self {
        self.revalidate = true;
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}
