use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{BinmapError, Result};

/// Recursively copy `src` into `dst`, skipping any directory named in `exclude`.
///
/// Existing files under `dst` are overwritten; unrelated files are left alone.
/// A single-file `src` is copied to `dst` directly. Symlinks are recreated,
/// not followed. Returns the number of files and links copied.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[String]) -> Result<usize> {
    let copy_err = |source: std::io::Error| BinmapError::Copy {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };

    let meta = fs::metadata(src).map_err(copy_err)?;
    if meta.is_file() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(copy_err)?;
        }
        fs::copy(src, dst).map_err(copy_err)?;
        return Ok(1);
    }

    let mut copied = 0;
    let walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir()
            && entry.depth() > 0
            && exclude.iter().any(|name| entry.file_name() == name.as_str()))
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            copy_err(e.into_io_error().unwrap_or_else(|| std::io::Error::other("walk error")))
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(copy_err)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(copy_err)?;
            }
            fs::copy(entry.path(), &target).map_err(copy_err)?;
            copied += 1;
        } else if entry.path_is_symlink() {
            copy_symlink(entry.path(), &target).map_err(copy_err)?;
            copied += 1;
        } else {
            warn!(path = %entry.path().display(), "not a file, directory, or symlink; not copied");
        }
    }
    debug!(src = %src.display(), dst = %dst.display(), files = copied, "copied tree");
    Ok(copied)
}

/// Recreate the link at `target` with the same (unresolved) link target.
#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    let points_to = fs::read_link(link)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(points_to, target)
}

/// Without unix symlinks, the link's content is copied instead.
#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(link, target).map(|_| ())
}

/// Remove an existing destination (file or directory).
///
/// Failure is logged, not returned: the copy that follows will surface any
/// real problem.
pub fn remove_existing(dst: &Path) {
    let result = match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dst),
        Ok(_) => fs::remove_file(dst),
        Err(_) => return,
    };
    match result {
        Ok(()) => debug!(dst = %dst.display(), "removed existing destination"),
        Err(e) => warn!(dst = %dst.display(), error = %e, "failed to remove existing destination"),
    }
}
