//! Static unit-key to binary-name tables for Windows and Unix packaging.
//!
//! Keys are unit keys as produced by the resolver: an automation subfolder
//! name, the root-level automation file name, or the SDK root name.

use crate::config::RootConfig;
use crate::error::{BinmapError, Result};

/// Unit key -> Windows binary name.
pub const WIN_BINARIES: &[(&str, &str)] = &[
    ("CVAutomation.py", "CVAutomation.py"),
    ("cvpysdk", "cvpysdk-master"),
    ("Application", "Application"),
    ("Autocenter", "Autocenter"),
    ("AutomationUtils", "AutomationUtils"),
    ("BigDataApps", "BigDataApps"),
    ("CVTrials", "CVTrials"),
    ("Database", "Database"),
    ("dynamicindex", "dynamicindex"),
    ("FileSystem", "FileSystem"),
    ("HyperScale", "HyperScale"),
    ("Indexing", "Indexing"),
    ("Install", "Install"),
    ("Kubernetes", "Kubernetes"),
    ("Laptop", "Laptop"),
    ("MediaAgents", "MediaAgents"),
    ("Metallic", "Metallic"),
    ("MetallicHub", "MetallicHub"),
    ("MetallicRing", "MetallicRing"),
    ("Mobile", "Mobile"),
    ("NAS", "NAS"),
    ("Server", "Server"),
    ("Testcases", "Testcases"),
    ("VirtualServer", "VirtualServer"),
    ("Web", "Web"),
];

/// Unit key -> Unix binary name. Windows-only units are absent.
pub const UNIX_BINARIES: &[(&str, &str)] = &[
    ("CVAutomation.py", "CVAutomation.py"),
    ("cvpysdk", "cvpysdk"),
    ("Application", "Application"),
    ("AutomationUtils", "AutomationUtils"),
    ("BigDataApps", "BigDataApps"),
    ("Database", "Database"),
    ("dynamicindex", "dynamicindex"),
    ("FileSystem", "FileSystem"),
    ("HyperScale", "HyperScale"),
    ("Indexing", "Indexing"),
    ("Install", "Install"),
    ("Kubernetes", "Kubernetes"),
    ("MediaAgents", "MediaAgents"),
    ("NAS", "NAS"),
    ("Server", "Server"),
    ("Testcases", "Testcases"),
    ("VirtualServer", "VirtualServer"),
];

/// Lookup view over a pair of key -> binary tables.
#[derive(Debug, Clone, Copy)]
pub struct MappingTables {
    pub win: &'static [(&'static str, &'static str)],
    pub unix: &'static [(&'static str, &'static str)],
}

impl Default for MappingTables {
    fn default() -> Self {
        Self { win: WIN_BINARIES, unix: UNIX_BINARIES }
    }
}

impl MappingTables {
    pub fn win_binary(&self, key: &str) -> Option<&'static str> {
        lookup(self.win, key)
    }

    pub fn unix_binary(&self, key: &str) -> Option<&'static str> {
        lookup(self.unix, key)
    }

    /// Recover the unit key that a Windows binary token came from.
    pub fn key_for_win_binary(&self, token: &str) -> Result<&'static str> {
        self.win
            .iter()
            .find(|(_, bin)| *bin == token)
            .map(|(key, _)| *key)
            .ok_or_else(|| BinmapError::ResolutionGap(token.to_string()))
    }

    /// Recover the source-relative path a Windows binary token came from.
    ///
    /// The SDK root key maps to the root itself; every other key lives
    /// directly under the automation root.
    pub fn reverse_lookup(&self, token: &str, roots: &RootConfig) -> Result<String> {
        let key = self.key_for_win_binary(token)?;
        if key == roots.sdk_root {
            Ok(key.to_string())
        } else {
            Ok(format!("{}/{}", roots.automation_root, key))
        }
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, bin)| *bin)
}
