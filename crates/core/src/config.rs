use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BinmapError, Result};

/// Serializable tool configuration.
///
/// Every field has a default, so an empty YAML/JSON document (or no file at
/// all) yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Name of the per-run directory under the destination root.
    pub run_name: String,
    pub roots: RootConfig,
    pub master: MasterConfig,
    pub pool: PoolConfig,
    pub analyzer: AnalyzerConfig,
    pub vcs: VcsConfig,
    pub dependency_manifests: DependencyManifestConfig,
    /// Directory names never copied into the output tree.
    pub exclude_dirs: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            run_name: "package".to_string(),
            roots: RootConfig::default(),
            master: MasterConfig::default(),
            pool: PoolConfig::default(),
            analyzer: AnalyzerConfig::default(),
            vcs: VcsConfig::default(),
            dependency_manifests: DependencyManifestConfig::default(),
            exclude_dirs: vec![".svn".to_string(), ".git".to_string()],
        }
    }
}

impl ToolConfig {
    /// Load a config file; `.json` parses as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| BinmapError::config(path, e))?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&body).map_err(|e| BinmapError::config(path, e))
        } else if body.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yaml::from_str(&body).map_err(|e| BinmapError::config(path, e))
        }
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Named top-level roots that get special treatment during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// SDK root: materialized as a whole, keyed by its own name.
    pub sdk_root: String,
    /// Automation root: units are its immediate subfolders.
    pub automation_root: String,
    /// Root-level file under the automation root that is its own unit.
    pub root_file: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            sdk_root: "cvpysdk".to_string(),
            automation_root: "Automation".to_string(),
            root_file: "CVAutomation.py".to_string(),
        }
    }
}

/// The seeded "master" token and the single master-like token that is a real binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub token: String,
    pub allowed_exception: String,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            token: "cv-automation-master".to_string(),
            allowed_exception: "cvpysdk-master".to_string(),
        }
    }
}

impl MasterConfig {
    /// True for placeholder tokens that carry no unit of their own.
    pub fn is_placeholder(&self, token: &str) -> bool {
        token != self.allowed_exception && (token == self.token || token.ends_with("-master"))
    }
}

/// Limits for the analysis worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of tasks running at once (K).
    pub concurrency: usize,
    /// Maximum number of tasks dispatched in one run (M).
    pub max_dispatch: usize,
    /// Per-task timeout; `0` disables it.
    pub task_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { concurrency: 2, max_dispatch: 20, task_timeout_secs: 300 }
    }
}

impl PoolConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        (self.task_timeout_secs > 0).then(|| Duration::from_secs(self.task_timeout_secs))
    }
}

/// External single-file analyzer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// File extensions (without the dot) eligible for analysis.
    pub extensions: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: "pylint".to_string(),
            args: vec!["--output-format=json".to_string()],
            extensions: vec!["py".to_string()],
        }
    }
}

impl AnalyzerConfig {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Subfolder marker plus the upstream path fetched when it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRule {
    pub marker: String,
    pub upstream_path: String,
}

impl CheckoutRule {
    /// Markers match by substring against the unit's subfolder.
    pub fn matches(&self, subfolder: &str) -> bool {
        !self.marker.is_empty() && subfolder.contains(&self.marker)
    }
}

/// Version-control settings for the two fetch-based strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    pub program: String,
    /// Base URL; upstream paths are appended to it.
    pub repository_url: String,
    /// Staging directory (relative to the destination root) for full checkouts.
    pub staging_dir: String,
    /// Strategy A: full checkout replaces the local tree.
    pub full_checkout: CheckoutRule,
    /// Strategy B: local tree plus a checked-out `packages` overlay.
    pub packages_overlay: CheckoutRule,
    pub packages_dir: String,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            program: "svn".to_string(),
            repository_url: "svn://localhost/automation/trunk".to_string(),
            staging_dir: ".checkout".to_string(),
            full_checkout: CheckoutRule {
                marker: "Autocenter".to_string(),
                upstream_path: "Automation/Autocenter".to_string(),
            },
            packages_overlay: CheckoutRule {
                marker: "Web".to_string(),
                upstream_path: "ThirdParty/Web/packages".to_string(),
            },
            packages_dir: "packages".to_string(),
        }
    }
}

impl VcsConfig {
    pub fn upstream_url(&self, upstream_path: &str) -> String {
        format!(
            "{}/{}",
            self.repository_url.trim_end_matches('/'),
            upstream_path.trim_start_matches('/')
        )
    }
}

/// Best-effort dependency-manifest downloads for selected subfolders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyManifestConfig {
    /// Base URL; an empty value disables downloads.
    pub base_url: String,
    pub file_name: String,
    pub subfolders: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for DependencyManifestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            file_name: "requirements.txt".to_string(),
            subfolders: vec!["Web".to_string(), "MetallicHub".to_string()],
            timeout_secs: 30,
        }
    }
}

impl DependencyManifestConfig {
    /// Download URL for `subfolder`, if downloads are enabled for it.
    pub fn url_for(&self, subfolder: &str) -> Option<String> {
        if self.base_url.is_empty() || !self.subfolders.iter().any(|s| s == subfolder) {
            return None;
        }
        Some(format!("{}/{}/{}", self.base_url.trim_end_matches('/'), subfolder, self.file_name))
    }
}
