use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use binmap_core::analysis::{select_inputs, Analyzer, AnalysisWorkerPool, PoolRun};
use binmap_core::changeset::parse_path_list;
use binmap_core::config::ToolConfig;
use binmap_core::layout::OutputLayout;
use binmap_core::report::ReportRenderer;

/// Run the bounded analysis pool over a path-list manifest and write the HTML report.
///
/// Errors here never undo the mapping path's output.
pub fn lint_command(
    lint_changefile: &Path,
    source_root: &Path,
    config: &ToolConfig,
    layout: &OutputLayout,
    analyzer: &dyn Analyzer,
) -> Result<PoolRun> {
    if !lint_changefile.is_file() {
        return Err(anyhow!("Lint change file does not exist: {}", lint_changefile.display()));
    }
    let body = fs::read_to_string(lint_changefile).with_context(|| {
        format!("Failed to read lint change file {}", lint_changefile.display())
    })?;
    let paths: Vec<String> = parse_path_list(&body).into_iter().map(|e| e.raw_path).collect();
    let inputs = select_inputs(&paths, source_root, &config.analyzer);

    let pool = AnalysisWorkerPool::new(analyzer, &config.pool);
    let run = pool.run(&inputs);

    ReportRenderer::default()
        .with_display_root(source_root)
        .write(&run, &layout.report_path)
        .context("Failed to render analysis report")?;

    println!("Analysis report: {}", layout.report_path.display());
    println!("  Dispatched: {}", run.dispatched);
    println!("  Completed: {}", run.completed());
    println!("  Cancelled: {}", run.cancelled());
    println!("  Not analyzed (limit): {}", run.skipped.len());

    Ok(run)
}
