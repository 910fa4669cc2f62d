//! Core data model: change entries, resolved units, and the unit-key set.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a change entry was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A changed source path from a path-list manifest.
    File,
    /// A path recovered from a binary token in a binary-list manifest.
    BinaryToken,
}

/// One line of a change manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub raw_path: String,
    pub kind: EntryKind,
}

impl ChangeEntry {
    pub fn file(raw_path: impl Into<String>) -> Self {
        Self { raw_path: raw_path.into(), kind: EntryKind::File }
    }

    pub fn binary_token(raw_path: impl Into<String>) -> Self {
        Self { raw_path: raw_path.into(), kind: EntryKind::BinaryToken }
    }
}

/// A change entry classified into root / subfolder / unit.
///
/// `source_path` is `None` when there is nothing on disk to materialize; such
/// units are skipped downstream but still logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUnit {
    pub raw_path: String,
    pub root: String,
    pub subfolder: String,
    pub unit_name: String,
    /// Key used for deduplication and mapping-table lookups.
    pub key: String,
    pub source_path: Option<PathBuf>,
    pub dest_path: Option<PathBuf>,
    pub is_file: bool,
}

/// A deduplicated unit key plus the first raw path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitKey {
    pub key: String,
    pub origin: String,
}

/// Insertion-ordered set of unit keys; the first occurrence of a key wins.
#[derive(Debug, Clone, Default)]
pub struct UnitKeySet {
    keys: Vec<UnitKey>,
    seen: HashSet<String>,
}

impl UnitKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key`; returns false when it was already present.
    pub fn insert(&mut self, key: impl Into<String>, origin: impl Into<String>) -> bool {
        let key = key.into();
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.keys.push(UnitKey { key, origin: origin.into() });
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitKey> {
        self.keys.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a> FromIterator<&'a ResolvedUnit> for UnitKeySet {
    fn from_iter<I: IntoIterator<Item = &'a ResolvedUnit>>(iter: I) -> Self {
        let mut set = UnitKeySet::new();
        for unit in iter {
            if !unit.key.is_empty() {
                set.insert(unit.key.clone(), unit.raw_path.clone());
            }
        }
        set
    }
}
