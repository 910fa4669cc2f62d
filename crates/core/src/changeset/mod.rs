//! Change-manifest loading.
//!
//! Two formats are accepted:
//! - path lists: UTF-8 text, one source-relative path per line;
//! - binary lists: a JSON object with a `WinBinaries` string array, whose
//!   tokens are reverse-mapped to the paths they were built from.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{MasterConfig, RootConfig};
use crate::error::{BinmapError, Result};
use crate::mapping::MappingTables;
use crate::model::ChangeEntry;

/// Manifest flavors understood by [`load_change_set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    PathList,
    BinaryList,
}

impl ManifestFormat {
    /// `.json` files and bodies starting with `{` are binary lists.
    pub fn detect(path: &Path, body: &str) -> Self {
        if path.extension().and_then(|e| e.to_str()) == Some("json")
            || body.trim_start().starts_with('{')
        {
            ManifestFormat::BinaryList
        } else {
            ManifestFormat::PathList
        }
    }
}

#[derive(Debug, Deserialize)]
struct BinaryListManifest {
    #[serde(rename = "WinBinaries", alias = "windowsBinaries", default)]
    win_binaries: Vec<String>,
}

/// Load a change manifest from disk, auto-detecting its format.
///
/// Input order and duplicates are preserved.
pub fn load_change_set(
    path: &Path,
    tables: &MappingTables,
    roots: &RootConfig,
    master: &MasterConfig,
) -> Result<Vec<ChangeEntry>> {
    if !path.is_file() {
        return Err(BinmapError::config(path, "change manifest does not exist"));
    }
    let body = std::fs::read_to_string(path).map_err(|e| BinmapError::config(path, e))?;
    let entries = match ManifestFormat::detect(path, &body) {
        ManifestFormat::PathList => parse_path_list(&body),
        ManifestFormat::BinaryList => parse_binary_list(&body, tables, roots, master)
            .map_err(|e| match e {
                BinmapError::Config { reason, .. } => BinmapError::config(path, reason),
                other => other,
            })?,
    };
    info!(manifest = %path.display(), entries = entries.len(), "loaded change manifest");
    Ok(entries)
}

/// Parse a path-list manifest; blank and whitespace-only lines are dropped.
pub fn parse_path_list(body: &str) -> Vec<ChangeEntry> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ChangeEntry::file)
        .collect()
}

/// Parse a binary-list manifest and reverse-map its tokens to paths.
///
/// Master placeholders are dropped; tokens with no reverse mapping are
/// logged and skipped.
pub fn parse_binary_list(
    body: &str,
    tables: &MappingTables,
    roots: &RootConfig,
    master: &MasterConfig,
) -> Result<Vec<ChangeEntry>> {
    let manifest: BinaryListManifest = serde_json::from_str(body)
        .map_err(|e| BinmapError::config("<binary list>", format!("invalid binary list: {e}")))?;

    let mut entries = Vec::new();
    for token in manifest.win_binaries {
        if master.is_placeholder(&token) {
            debug!(%token, "skipping master placeholder token");
            continue;
        }
        match tables.reverse_lookup(&token, roots) {
            Ok(path) => {
                debug!(%token, %path, "reverse-mapped binary token");
                entries.push(ChangeEntry::binary_token(path));
            }
            Err(err) => warn!(%token, error = %err, "binary token has no reverse mapping; skipping"),
        }
    }
    Ok(entries)
}
