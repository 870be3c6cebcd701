//! Immutable key→value lookup table.
//!
//! Keys are hashed with FNV-1a and the hashes index a `BTreeMap`; each tree
//! node holds the (usually single) entries sharing that hash, compared
//! byte-for-byte on lookup. A table is built once during configuration and
//! only read afterwards, so it can be shared across request contexts through
//! an `Arc` without locking.

mod source;

pub use source::{MemoryLoader, TableLoader};

use std::collections::BTreeMap;

/// Stored key/value pair. Value bytes are owned by the table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: Box<[u8]>,
    value: Box<[u8]>,
}

/// Read-only key→value table with exact-match lookup.
///
/// # Examples
/// ```
/// use k2bot::LookupTable;
///
/// let table = LookupTable::from_entries([("static-key", "crawler")]);
/// assert_eq!(table.find(b"static-key"), Some((&b"crawler"[..], 7)));
/// assert_eq!(table.find(b"static"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    buckets: BTreeMap<u64, Vec<Entry>>,
    len: usize,
}

impl LookupTable {
    /// Create a table with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a table.
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Build a table from key/value pairs.
    ///
    /// Later pairs replace earlier ones with the same key.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut builder = TableBuilder::new();
        for (key, value) in entries {
            builder.insert(key, value);
        }
        builder.build()
    }

    /// Find the value stored under exactly `key`.
    ///
    /// Returns the stored bytes (not a copy) and their length.
    pub fn find(&self, key: &[u8]) -> Option<(&[u8], usize)> {
        if self.len == 0 {
            return None;
        }

        let bucket = self.buckets.get(&fnv1a_hash(key))?;
        bucket
            .iter()
            .find(|e| &*e.key == key)
            .map(|e| (&*e.value, e.value.len()))
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find(key).is_some()
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over all entries in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.buckets
            .values()
            .flatten()
            .map(|e| (&*e.key, &*e.value))
    }
}

/// Mutable staging area for a [`LookupTable`].
#[derive(Debug, Default)]
pub struct TableBuilder {
    buckets: BTreeMap<u64, Vec<Entry>>,
    len: usize,
}

impl TableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing the value of an existing key.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        let key = key.as_ref();
        let value: Box<[u8]> = value.as_ref().into();
        let bucket = self.buckets.entry(fnv1a_hash(key)).or_default();

        match bucket.iter_mut().find(|e| &*e.key == key) {
            Some(existing) => {
                log::warn!(
                    "Duplicate table key {:?}, keeping the last value",
                    String::from_utf8_lossy(key)
                );
                existing.value = value;
            }
            None => {
                bucket.push(Entry {
                    key: key.into(),
                    value,
                });
                self.len += 1;
            }
        }

        self
    }

    /// Get the number of distinct keys inserted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Freeze the builder into a table.
    pub fn build(self) -> LookupTable {
        LookupTable {
            buckets: self.buckets,
            len: self.len,
        }
    }
}

/// FNV-1a hash of a key.
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
