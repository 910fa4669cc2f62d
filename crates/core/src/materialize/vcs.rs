use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{BinmapError, Result};

/// Version-control client used by the checkout-based strategies.
pub trait VcsClient: Send + Sync {
    /// Check `url` out into `dest`, creating or updating a working copy.
    fn checkout(&self, url: &str, dest: &Path) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Subversion client that shells out to the `svn` command line.
pub struct SvnClient {
    pub program: PathBuf,
}

impl SvnClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl VcsClient for SvnClient {
    fn checkout(&self, url: &str, dest: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["checkout", "--non-interactive", "--quiet", url])
            .arg(dest)
            .output()
            .map_err(|e| BinmapError::Checkout {
                url: url.to_string(),
                reason: format!("failed to spawn {}: {e}", self.program.display()),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BinmapError::Checkout {
                url: url.to_string(),
                reason: format!("{} exited with {}: {}", self.name(), output.status, stderr.trim()),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "svn"
    }
}
