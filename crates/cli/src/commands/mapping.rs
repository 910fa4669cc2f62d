use std::path::Path;

use anyhow::{Context, Result};
use binmap_core::changeset::load_change_set;
use binmap_core::config::ToolConfig;
use binmap_core::layout::OutputLayout;
use binmap_core::manifest::BinaryManifest;
use binmap_core::mapping::MappingTables;
use binmap_core::materialize::{
    DependencyFetcher, MaterializeSummary, Materializer, VcsClient,
};
use binmap_core::model::{ResolvedUnit, UnitKeySet};
use binmap_core::resolver::{unit_keys, PathResolver};

/// Everything the mapping path produced in one run.
#[derive(Debug)]
pub struct MappingOutcome {
    pub units: Vec<ResolvedUnit>,
    pub keys: UnitKeySet,
    pub manifest: BinaryManifest,
    pub materialized: Option<MaterializeSummary>,
}

/// Load a change manifest and resolve it against `source_root`.
pub fn resolve_change_set(
    changefile: &Path,
    source_root: &Path,
    config: &ToolConfig,
    layout: &OutputLayout,
) -> Result<(Vec<ResolvedUnit>, UnitKeySet)> {
    let tables = MappingTables::default();
    let entries = load_change_set(changefile, &tables, &config.roots, &config.master)
        .context("Failed to load change manifest")?;
    let resolver = PathResolver::new(&config.roots, source_root, &layout.run_dir);
    let units = resolver.resolve_all(&entries);
    let keys = unit_keys(&units);
    Ok((units, keys))
}

fn write_manifest(
    keys: &UnitKeySet,
    labels: &[String],
    config: &ToolConfig,
    layout: &OutputLayout,
) -> Result<BinaryManifest> {
    let mut manifest = BinaryManifest::from_keys(keys, &MappingTables::default(), &config.master);
    manifest.add_labels(labels, &config.master);
    manifest.write(&layout.manifest_path).context("Failed to write binary manifest")?;
    Ok(manifest)
}

/// `getBinary` mode: resolve and emit the binary manifest only.
pub fn get_binary_command(
    changefile: &Path,
    source_root: &Path,
    config: &ToolConfig,
    layout: &OutputLayout,
    labels: &[String],
) -> Result<MappingOutcome> {
    let (units, keys) = resolve_change_set(changefile, source_root, config, layout)?;
    let manifest = write_manifest(&keys, labels, config, layout)?;

    println!("Binary manifest: {}", layout.manifest_path.display());
    println!("  Windows binaries: {}", manifest.win_binaries.join(", "));
    println!("  Unix binaries: {}", manifest.unix_binaries.join(", "));

    Ok(MappingOutcome { units, keys, manifest, materialized: None })
}

/// `build` mode: resolve, materialize into the run tree, and emit the manifest.
pub fn build_command(
    changefile: &Path,
    source_root: &Path,
    config: &ToolConfig,
    layout: &OutputLayout,
    labels: &[String],
    vcs: &dyn VcsClient,
    fetcher: &dyn DependencyFetcher,
) -> Result<MappingOutcome> {
    let (units, keys) = resolve_change_set(changefile, source_root, config, layout)?;

    let materializer = Materializer { config, layout, vcs, fetcher };
    let summary = materializer
        .materialize_all(&units)
        .with_context(|| format!("Failed to materialize units into {}", layout.run_dir.display()))?;

    let manifest = write_manifest(&keys, labels, config, layout)?;

    println!("Build output: {}", layout.run_dir.display());
    println!("  Units materialized: {}", summary.materialized.len());
    println!("  Files copied: {}", summary.files_copied);
    println!("  Skipped (no source): {}", summary.skipped.len());
    if !summary.checkout_failures.is_empty() {
        println!("  Checkout failures: {}", summary.checkout_failures.join(", "));
    }
    println!("Binary manifest: {}", layout.manifest_path.display());

    Ok(MappingOutcome { units, keys, manifest, materialized: Some(summary) })
}
