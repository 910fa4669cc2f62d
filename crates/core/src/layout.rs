use std::path::{Component, Path, PathBuf};

/// Logical layout of one run's outputs on disk.
///
/// This is derived from the destination root. It does *not* perform any IO
/// itself; the materializer, writers, and CLI create what they need.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Destination root given on the command line.
    pub root: PathBuf,
    /// Per-run tree that materialized units land in.
    pub run_dir: PathBuf,
    /// Structured text log.
    pub log_path: PathBuf,
    /// Binary manifest (JSON).
    pub manifest_path: PathBuf,
    /// Analysis report (HTML).
    pub report_path: PathBuf,
    /// Scratch space for full VCS checkouts.
    pub staging_dir: PathBuf,
}

/// Fixed file name of the analysis report.
pub const REPORT_FILE_NAME: &str = "cvlintoutput.html";
/// Fixed file name of the binary manifest.
pub const MANIFEST_FILE_NAME: &str = "binaries.json";
/// Fixed file name of the run log.
pub const LOG_FILE_NAME: &str = "binmap.log";

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>, run_name: &str, staging_dir: &str) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            run_dir: root.join(run_name),
            log_path: root.join(LOG_FILE_NAME),
            manifest_path: root.join(MANIFEST_FILE_NAME),
            report_path: root.join(REPORT_FILE_NAME),
            staging_dir: root.join(staging_dir),
            root,
        }
    }

    /// Destination of a unit given its path relative to the source root.
    pub fn unit_dest(&self, relative: &Path) -> PathBuf {
        self.run_dir.join(relative)
    }

    /// True when `path` is strictly below the run directory.
    ///
    /// The check is lexical: `..` and root components never count as inside.
    pub fn is_within_run_dir(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.run_dir) {
            Ok(rel) => {
                rel.components().next().is_some()
                    && rel.components().all(|c| matches!(c, Component::Normal(_)))
            }
            Err(_) => false,
        }
    }

    /// Staging directory for a full checkout of `subfolder`.
    pub fn staging_for(&self, subfolder: &str) -> PathBuf {
        self.staging_dir.join(subfolder)
    }
}
