use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use binmap_core::analysis::ExternalAnalyzer;
use binmap_core::config::ToolConfig;
use binmap_core::layout::OutputLayout;
use binmap_core::materialize::{HttpFetcher, SvnClient};
use clap::ValueEnum;
use tracing::info;

use crate::commands::{build_command, get_binary_command, lint_command};

/// Which mapping flow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Materialize affected units and write the binary manifest.
    #[value(name = "build")]
    Build,
    /// Write the binary manifest only.
    #[value(name = "getBinary")]
    GetBinary,
}

/// Fully parsed invocation.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub mode: Mode,
    pub changefile: PathBuf,
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub lint_changefile: Option<PathBuf>,
    pub official: bool,
    pub config: Option<PathBuf>,
    pub run_name: Option<String>,
    pub labels: Vec<String>,
}

/// Load config (with CLI overrides applied) and compute the output layout.
pub fn prepare(args: &RunArgs) -> Result<(ToolConfig, OutputLayout)> {
    let mut config = ToolConfig::load_or_default(args.config.as_deref())
        .context("Failed to load tool config")?;
    if let Some(name) = &args.run_name {
        config.run_name = name.clone();
    }
    let layout =
        OutputLayout::new(&args.destination_root, &config.run_name, &config.vcs.staging_dir);
    Ok((config, layout))
}

/// Run the mapping path, then (unless official) the analysis path.
pub fn run_command(args: &RunArgs, config: &ToolConfig, layout: &OutputLayout) -> Result<()> {
    if !args.source_root.is_dir() {
        return Err(anyhow!("Source root does not exist: {}", args.source_root.display()));
    }
    info!(
        mode = ?args.mode,
        changefile = %args.changefile.display(),
        source = %args.source_root.display(),
        dest = %layout.root.display(),
        "starting run"
    );

    match args.mode {
        Mode::Build => {
            let vcs = SvnClient::new(&config.vcs.program);
            let fetcher = HttpFetcher::new(Duration::from_secs(
                config.dependency_manifests.timeout_secs,
            ));
            build_command(
                &args.changefile,
                &args.source_root,
                config,
                layout,
                &args.labels,
                &vcs,
                &fetcher,
            )?;
        }
        Mode::GetBinary => {
            get_binary_command(
                &args.changefile,
                &args.source_root,
                config,
                layout,
                &args.labels,
            )?;
        }
    }

    match (&args.lint_changefile, args.official) {
        (Some(lint_file), false) => {
            let analyzer = ExternalAnalyzer::from_config(&config.analyzer);
            lint_command(lint_file, &args.source_root, config, layout, &analyzer)?;
        }
        (Some(_), true) => info!("official build; analysis skipped"),
        (None, _) => info!("no lint change file given; analysis skipped"),
    }
    Ok(())
}
