//! Snapshot group engine.
//!
//! A group is the unit the store persists: an ordered map of named tables,
//! each holding opaque rows keyed by string. Commits encode the whole group
//! into a snapshot envelope and hand it to the storage backend.
//!
//! ## Snapshot Envelope
//!
//! ```text
//! | magic (4) | version (2) | payload_len (8) | CBOR payload | padding... |
//! ```
//!
//! All integers are little-endian. Bytes past `payload_len` are ignored on
//! decode - a backing file may be larger than the image it holds, either
//! because of a reservation or because a rewrite never shrinks the file.
//!
//! An empty byte slice decodes to an empty group (a freshly created store).
//! A bad magic, unsupported version, or truncated payload is corruption and
//! fails the open.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Magic bytes identifying a Covault snapshot.
const SNAPSHOT_MAGIC: [u8; 4] = *b"CVLT";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u16 = 1;

/// Envelope header size: magic (4) + version (2) + payload_len (8).
const HEADER_SIZE: usize = 14;

/// A named table of opaque rows.
///
/// Rows are keyed by string and hold caller-supplied bytes; Covault does
/// not interpret row payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: BTreeMap<String, Vec<u8>>,
}

impl Table {
    /// Inserts or replaces a row.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.rows.insert(key.into(), value.into());
    }

    /// Returns a row's payload, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Removes a row, returning its payload if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.rows.remove(key)
    }

    /// Whether a row with the given key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Removes all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Iterates over row keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

/// The committed contents of a store: named tables in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    tables: BTreeMap<String, Table>,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns the table with the given name, creating it if missing.
    pub fn table_mut_or_create(&mut self, name: &str) -> &mut Table {
        self.tables.entry(name.to_string()).or_default()
    }

    /// Whether a table with the given name exists.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Iterates over table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Whether the group has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Encodes the group into a snapshot envelope.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if CBOR encoding fails.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut payload = Vec::new();
        ciborium::ser::into_writer(self, &mut payload)
            .map_err(|e| StoreError::invalid_format(format!("snapshot encode failed: {e}")))?;

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&payload);

        Ok(out)
    }

    /// Decodes a snapshot envelope.
    ///
    /// An empty slice is a fresh store and decodes to an empty group.
    /// Trailing bytes past the declared payload length are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for a truncated header, wrong magic,
    /// unsupported version, or undecodable payload.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }

        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::invalid_format("snapshot header truncated"));
        }

        if bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(StoreError::invalid_format("bad snapshot magic"));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SNAPSHOT_VERSION {
            return Err(StoreError::invalid_format(format!(
                "unsupported snapshot version {version}"
            )));
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[6..HEADER_SIZE]);
        let payload_len = usize::try_from(u64::from_le_bytes(len_bytes))
            .map_err(|_| StoreError::invalid_format("snapshot payload length out of range"))?;

        let end = HEADER_SIZE
            .checked_add(payload_len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| StoreError::invalid_format("snapshot payload truncated"))?;

        ciborium::de::from_reader(&bytes[HEADER_SIZE..end])
            .map_err(|e| StoreError::invalid_format(format!("snapshot decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_decode_to_empty_group() {
        let group = Group::decode(&[]).unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn encode_decode_preserves_tables() {
        let mut group = Group::new();
        group.table_mut_or_create("events").put("a", vec![1, 2]);
        group.table_mut_or_create("users").put("alice", vec![3]);

        let decoded = Group::decode(&group.encode().unwrap()).unwrap();
        assert_eq!(decoded, group);
        assert_eq!(decoded.table("events").unwrap().get("a"), Some(&[1, 2][..]));
    }

    #[test]
    fn trailing_padding_is_ignored() {
        let mut group = Group::new();
        group.table_mut_or_create("t").put("k", vec![9]);

        let mut bytes = group.encode().unwrap();
        bytes.resize(bytes.len() + 4096, 0);

        let decoded = Group::decode(&bytes).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = Group::new().encode().unwrap();
        bytes[0] = b'X';

        let err = Group::decode(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut bytes = Group::new().encode().unwrap();
        bytes[4] = 0xFF;

        let err = Group::decode(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = Group::decode(b"CVLT").unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut group = Group::new();
        group.table_mut_or_create("t").put("key", vec![0; 64]);

        let bytes = group.encode().unwrap();
        let err = Group::decode(&bytes[..bytes.len() - 8]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat { .. }));
    }

    #[test]
    fn table_row_operations() {
        let mut table = Table::default();
        assert!(table.is_empty());

        table.put("k1", vec![1]);
        table.put("k2", vec![2]);
        assert_eq!(table.len(), 2);
        assert!(table.contains_key("k1"));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["k1", "k2"]);

        table.put("k1", vec![9]);
        assert_eq!(table.get("k1"), Some(&[9][..]));
        assert_eq!(table.len(), 2);

        assert_eq!(table.remove("k2"), Some(vec![2]));
        assert!(!table.contains_key("k2"));

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn group_get_or_create_is_idempotent() {
        let mut group = Group::new();
        group.table_mut_or_create("t").put("k", vec![1]);
        group.table_mut_or_create("t").put("k2", vec![2]);

        assert_eq!(group.table_count(), 1);
        assert_eq!(group.table("t").unwrap().len(), 2);
        assert!(group.has_table("t"));
        assert!(!group.has_table("other"));
    }
}
