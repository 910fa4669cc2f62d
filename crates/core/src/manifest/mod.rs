//! Binary manifest emission.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::MasterConfig;
use crate::error::{BinmapError, Result};
use crate::mapping::MappingTables;
use crate::model::UnitKeySet;

/// Affected logical units, split by target OS.
///
/// `win_binaries[0]` is always the master token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryManifest {
    #[serde(rename = "WinBinaries")]
    pub win_binaries: Vec<String>,
    #[serde(rename = "UnixBinaries")]
    pub unix_binaries: Vec<String>,
}

impl BinaryManifest {
    /// An empty manifest seeded with the master token.
    pub fn seeded(master: &MasterConfig) -> Self {
        Self { win_binaries: vec![master.token.clone()], unix_binaries: Vec::new() }
    }

    /// Build a manifest from deduplicated unit keys.
    ///
    /// Keys absent from both tables are left out with a warning naming the
    /// path that produced them.
    pub fn from_keys(keys: &UnitKeySet, tables: &MappingTables, master: &MasterConfig) -> Self {
        let mut manifest = Self::seeded(master);
        for unit in keys.iter() {
            let win = tables.win_binary(&unit.key);
            let unix = tables.unix_binary(&unit.key);
            if win.is_none() && unix.is_none() {
                warn!(
                    key = %unit.key,
                    path = %unit.origin,
                    "unit has no binary mapping; omitted from manifest"
                );
                continue;
            }
            if let Some(bin) = win {
                push_unique(&mut manifest.win_binaries, bin);
            }
            if let Some(bin) = unix {
                push_unique(&mut manifest.unix_binaries, bin);
            }
        }
        manifest
    }

    /// Merge extra binary labels, routed by suffix.
    ///
    /// `.tar`/`.sh` are Unix-only, `.see`/`.cmd` Windows-only, anything else
    /// goes to both lists. Master placeholders never enter the Unix list.
    pub fn add_labels<S: AsRef<str>>(&mut self, labels: &[S], master: &MasterConfig) {
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if label.ends_with(".tar") || label.ends_with(".sh") {
                push_unique(&mut self.unix_binaries, label);
            } else if label.ends_with(".see") || label.ends_with(".cmd") {
                push_unique(&mut self.win_binaries, label);
            } else {
                push_unique(&mut self.win_binaries, label);
                if !master.is_placeholder(label) {
                    push_unique(&mut self.unix_binaries, label);
                }
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BinmapError::config("<binary manifest>", e))
    }

    /// Serialize to `path`, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BinmapError::config(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| BinmapError::config(path, e))?;
        info!(
            path = %path.display(),
            win = self.win_binaries.len(),
            unix = self.unix_binaries.len(),
            "wrote binary manifest"
        );
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
