//! Materialization of resolved units into the run output tree.
//!
//! Each unit is acquired with one of three strategies picked from its
//! subfolder name:
//! - full checkout: the unit comes entirely from version control;
//! - packages overlay: local copy, then a checked-out `packages` directory on top;
//! - plain copy of the local tree or file.
//!
//! Destinations are replaced with remove-then-copy. This is not atomic: if
//! the copy fails after the removal, the destination is left missing.

pub mod copy;
pub mod fetch;
pub mod vcs;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::error::{BinmapError, Result};
use crate::layout::OutputLayout;
use crate::model::ResolvedUnit;

pub use copy::{copy_tree, remove_existing};
pub use fetch::{DependencyFetcher, HttpFetcher};
pub use vcs::{SvnClient, VcsClient};

/// How a unit's content is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FullCheckout,
    PackagesOverlay,
    Copy,
}

/// Outcome counters for one materialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Destinations written, in processing order.
    pub materialized: Vec<PathBuf>,
    /// Raw paths skipped for lack of a source.
    pub skipped: Vec<String>,
    /// Units whose checkout failed.
    pub checkout_failures: Vec<String>,
    pub files_copied: usize,
    pub downloads: usize,
}

pub struct Materializer<'a> {
    pub config: &'a ToolConfig,
    pub layout: &'a OutputLayout,
    pub vcs: &'a dyn VcsClient,
    pub fetcher: &'a dyn DependencyFetcher,
}

impl<'a> Materializer<'a> {
    pub fn strategy_for(&self, subfolder: &str) -> Strategy {
        if self.config.vcs.full_checkout.matches(subfolder) {
            Strategy::FullCheckout
        } else if self.config.vcs.packages_overlay.matches(subfolder) {
            Strategy::PackagesOverlay
        } else {
            Strategy::Copy
        }
    }

    /// Materialize every unit with a source, once per destination.
    ///
    /// Copy failures abort the pass; checkout and download failures only
    /// affect their own unit.
    pub fn materialize_all(&self, units: &[ResolvedUnit]) -> Result<MaterializeSummary> {
        let mut summary = MaterializeSummary::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for unit in units {
            if let Some(dest) = &unit.dest_path {
                if unit.source_path.is_some() && !seen.insert(dest.clone()) {
                    continue;
                }
            }
            self.materialize(unit, &mut summary)?;
        }
        info!(
            materialized = summary.materialized.len(),
            skipped = summary.skipped.len(),
            checkout_failures = summary.checkout_failures.len(),
            files = summary.files_copied,
            "materialization finished"
        );
        Ok(summary)
    }

    pub fn materialize(&self, unit: &ResolvedUnit, summary: &mut MaterializeSummary) -> Result<()> {
        let (source, dest) = match (&unit.source_path, &unit.dest_path) {
            (Some(source), Some(dest)) => (source, dest),
            _ => {
                info!(path = %unit.raw_path, "no source path for unit; skipping");
                summary.skipped.push(unit.raw_path.clone());
                return Ok(());
            }
        };

        if !self.layout.is_within_run_dir(dest) {
            warn!(
                path = %unit.raw_path,
                dst = %dest.display(),
                run_dir = %self.layout.run_dir.display(),
                "destination is outside the run directory; skipping"
            );
            summary.skipped.push(unit.raw_path.clone());
            return Ok(());
        }

        remove_existing(dest);

        let strategy = self.strategy_for(&unit.subfolder);
        info!(
            unit = %unit.key,
            ?strategy,
            src = %source.display(),
            dst = %dest.display(),
            "materializing unit"
        );

        let outcome = match strategy {
            Strategy::FullCheckout => self.full_checkout(unit, dest, summary),
            Strategy::PackagesOverlay => self.packages_overlay(unit, source, dest, summary),
            Strategy::Copy => {
                summary.files_copied += copy_tree(source, dest, &self.config.exclude_dirs)?;
                Ok(())
            }
        };
        match outcome {
            Ok(()) => {}
            Err(err @ BinmapError::Checkout { .. }) => {
                warn!(unit = %unit.key, error = %err, "checkout failed; unit not materialized");
                summary.checkout_failures.push(unit.key.clone());
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        summary.materialized.push(dest.clone());
        if strategy != Strategy::FullCheckout && !unit.is_file {
            self.fetch_dependency_manifest(unit, dest, summary);
        }
        Ok(())
    }

    fn full_checkout(
        &self,
        unit: &ResolvedUnit,
        dest: &Path,
        summary: &mut MaterializeSummary,
    ) -> Result<()> {
        let rule = &self.config.vcs.full_checkout;
        let staging = self.layout.staging_for(&unit.subfolder);
        let url = self.config.vcs.upstream_url(&rule.upstream_path);
        std::fs::create_dir_all(&staging).map_err(|e| BinmapError::Checkout {
            url: url.clone(),
            reason: format!("failed to create staging dir {}: {e}", staging.display()),
        })?;

        info!(%url, staging = %staging.display(), vcs = self.vcs.name(), "full checkout");
        self.vcs.checkout(&url, &staging)?;
        summary.files_copied += copy_tree(&staging, dest, &self.config.exclude_dirs)?;
        Ok(())
    }

    fn packages_overlay(
        &self,
        unit: &ResolvedUnit,
        source: &Path,
        dest: &Path,
        summary: &mut MaterializeSummary,
    ) -> Result<()> {
        summary.files_copied += copy_tree(source, dest, &self.config.exclude_dirs)?;

        let vcs = &self.config.vcs;
        let url = vcs.upstream_url(&vcs.packages_overlay.upstream_path);
        let nested = source.join(&vcs.packages_dir);
        std::fs::create_dir_all(&nested).map_err(|e| BinmapError::Checkout {
            url: url.clone(),
            reason: format!("failed to create {}: {e}", nested.display()),
        })?;

        info!(unit = %unit.key, %url, into = %nested.display(), "packages checkout");
        self.vcs.checkout(&url, &nested)?;
        summary.files_copied +=
            copy_tree(&nested, &dest.join(&vcs.packages_dir), &self.config.exclude_dirs)?;
        Ok(())
    }

    fn fetch_dependency_manifest(
        &self,
        unit: &ResolvedUnit,
        dest: &Path,
        summary: &mut MaterializeSummary,
    ) {
        let deps = &self.config.dependency_manifests;
        let Some(url) = deps.url_for(&unit.subfolder) else {
            return;
        };
        let target = dest.join(&deps.file_name);
        match self.fetcher.fetch(&url).and_then(|body| {
            std::fs::write(&target, body).map_err(|e| format!("failed to write: {e}"))
        }) {
            Ok(()) => {
                info!(unit = %unit.key, %url, target = %target.display(), "downloaded dependency manifest");
                summary.downloads += 1;
            }
            Err(reason) => {
                warn!(unit = %unit.key, %url, %reason, "dependency manifest download failed")
            }
        }
    }
}
