//! Path -> unit classification and unit-key derivation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::RootConfig;
use crate::model::{ChangeEntry, ResolvedUnit, UnitKeySet};

/// Pure classification of a raw path, before any filesystem lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub root: String,
    pub subfolder: String,
    pub unit_name: String,
    /// Empty for degenerate single-segment paths.
    pub key: String,
    /// Path (relative to the source root) that holds the unit's content.
    pub relative: Option<PathBuf>,
    /// Known to be a single file regardless of what is on disk.
    pub is_file: bool,
}

/// Split a raw path on either separator, ignoring empty and `.` segments.
pub fn split_segments(raw: &str) -> Vec<&str> {
    raw.split(['/', '\\']).map(str::trim).filter(|s| !s.is_empty() && *s != ".").collect()
}

/// True for absolute or drive-prefixed paths and for paths that climb with `..`.
pub fn escapes_root(raw: &str) -> bool {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    raw.starts_with(['/', '\\'])
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
        || split_segments(raw).contains(&"..")
}

/// Classify `raw` into root / subfolder / unit and derive its unit key.
///
/// - three or more segments: root, first subfolder, last segment;
/// - two segments: the second segment is both subfolder and unit, except for
///   the configured root-level file, which has an empty subfolder;
/// - anything under the SDK root (or the bare root itself) is keyed by the
///   root name and materialized as a whole;
/// - any other single segment is degenerate, with nothing to materialize
///   and no key;
/// - paths that [`escapes_root`] rejects are classified like an empty path.
pub fn classify(raw: &str, roots: &RootConfig) -> Classification {
    let segments = if escapes_root(raw) { Vec::new() } else { split_segments(raw) };
    match segments.as_slice() {
        [] => Classification {
            root: String::new(),
            subfolder: String::new(),
            unit_name: String::new(),
            key: String::new(),
            relative: None,
            is_file: false,
        },
        [root, rest @ ..] if *root == roots.sdk_root => Classification {
            root: root.to_string(),
            subfolder: String::new(),
            unit_name: rest.last().unwrap_or(root).to_string(),
            key: root.to_string(),
            relative: Some(PathBuf::from(root)),
            is_file: false,
        },
        [only] => Classification {
            root: only.to_string(),
            subfolder: only.to_string(),
            unit_name: only.to_string(),
            key: String::new(),
            relative: None,
            is_file: false,
        },
        [root, name] if *name == roots.root_file => Classification {
            root: root.to_string(),
            subfolder: String::new(),
            unit_name: name.to_string(),
            key: name.to_string(),
            relative: Some(Path::new(root).join(name)),
            is_file: true,
        },
        [root, name] => Classification {
            root: root.to_string(),
            subfolder: name.to_string(),
            unit_name: name.to_string(),
            key: name.to_string(),
            relative: Some(Path::new(root).join(name)),
            is_file: false,
        },
        [root, subfolder, .., last] => Classification {
            root: root.to_string(),
            subfolder: subfolder.to_string(),
            unit_name: last.to_string(),
            key: subfolder.to_string(),
            relative: Some(Path::new(root).join(subfolder)),
            is_file: false,
        },
    }
}

/// Resolves change entries against a source tree and a run output tree.
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    pub roots: &'a RootConfig,
    pub source_root: &'a Path,
    pub run_dir: &'a Path,
}

impl<'a> PathResolver<'a> {
    pub fn new(roots: &'a RootConfig, source_root: &'a Path, run_dir: &'a Path) -> Self {
        Self { roots, source_root, run_dir }
    }

    pub fn resolve(&self, entry: &ChangeEntry) -> ResolvedUnit {
        let class = classify(&entry.raw_path, self.roots);

        let (source_path, dest_path, is_file) = match &class.relative {
            None if escapes_root(&entry.raw_path) => {
                warn!(
                    path = %entry.raw_path,
                    "path is absolute or leaves the source root; ignored"
                );
                (None, None, false)
            }
            None => {
                warn!(
                    path = %entry.raw_path,
                    "path has a single segment; nothing meaningful to materialize"
                );
                (None, None, false)
            }
            Some(rel) => {
                let source = self.source_root.join(rel);
                let dest = self.run_dir.join(rel);
                if source.exists() {
                    let is_file = class.is_file || source.is_file();
                    (Some(source), Some(dest), is_file)
                } else {
                    warn!(
                        path = %entry.raw_path,
                        source = %source.display(),
                        "unit source is missing on disk; it will not be materialized"
                    );
                    (None, Some(dest), class.is_file)
                }
            }
        };

        debug!(
            path = %entry.raw_path,
            root = %class.root,
            subfolder = %class.subfolder,
            unit = %class.unit_name,
            key = %class.key,
            "resolved change entry"
        );

        ResolvedUnit {
            raw_path: entry.raw_path.clone(),
            root: class.root,
            subfolder: class.subfolder,
            unit_name: class.unit_name,
            key: class.key,
            source_path,
            dest_path,
            is_file,
        }
    }

    /// Resolve every entry, preserving input order and duplicates.
    pub fn resolve_all(&self, entries: &[ChangeEntry]) -> Vec<ResolvedUnit> {
        let units: Vec<ResolvedUnit> = entries.iter().map(|e| self.resolve(e)).collect();
        info!(entries = entries.len(), "resolved change entries");
        units
    }
}

/// Collect the deduplicated, first-occurrence-ordered unit keys.
pub fn unit_keys(units: &[ResolvedUnit]) -> UnitKeySet {
    units.iter().collect()
}
