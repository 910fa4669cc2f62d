use std::path::PathBuf;

use anyhow::Result;
use binmap::commands::{prepare, run_command, Mode, RunArgs};
use binmap::{canonicalize_or_current, init_logging, is_official_build};
use clap::Parser;

/// Change-set mapper and bounded lint runner.
///
/// This CLI is a thin wrapper around `binmap-core`. It resolves the paths in a
/// change manifest to deployable units, then either materializes them and
/// writes a binary manifest (`build`) or writes the manifest only
/// (`getBinary`). When a lint change file is given, the listed files are
/// analyzed and summarized in `cvlintoutput.html`.
#[derive(Parser, Debug)]
#[command(
    name = "binmap",
    version,
    about = "Resolve changed paths to deployable units and package them",
    long_about = None
)]
struct Cli {
    /// Flow to run.
    #[arg(value_enum)]
    mode: Mode,

    /// Change manifest: a path list, or a JSON object with `WinBinaries`.
    changefile: PathBuf,

    /// Root of the source tree the changed paths are relative to.
    source_root: String,

    /// Destination root for the run tree, manifest, report, and log.
    destination_root: String,

    /// Optional path list of files to analyze.
    pylint_changefile: Option<PathBuf>,

    /// `true` for official builds, which skip analysis.
    is_official: Option<String>,

    /// Optional YAML/JSON tool config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the per-run directory under the destination root.
    #[arg(long)]
    run_name: Option<String>,

    /// Extra binary label to merge into the manifest (repeatable).
    #[arg(long = "label")]
    labels: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = RunArgs {
        mode: cli.mode,
        changefile: cli.changefile,
        source_root: canonicalize_or_current(&cli.source_root)?,
        destination_root: canonicalize_or_current(&cli.destination_root)?,
        lint_changefile: cli.pylint_changefile,
        official: is_official_build(cli.is_official.as_deref()),
        config: cli.config,
        run_name: cli.run_name,
        labels: cli.labels,
    };

    let (config, layout) = prepare(&args)?;
    init_logging(&layout.log_path)?;
    run_command(&args, &config, &layout)
}
