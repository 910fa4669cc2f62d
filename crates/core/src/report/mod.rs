//! HTML rendering of a pool run.
//!
//! Findings are the analyzer's own JSON and are embedded verbatim (escaped),
//! never interpreted.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::analysis::{AnalysisTask, PoolRun};
use crate::error::{BinmapError, Result};

#[derive(Debug, Clone)]
pub struct ReportRenderer {
    pub title: String,
    /// Prefix stripped from file paths for display.
    pub display_root: Option<PathBuf>,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self { title: "Lint report".to_string(), display_root: None }
    }
}

impl ReportRenderer {
    pub fn with_display_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.display_root = Some(root.into());
        self
    }

    pub fn render(&self, run: &PoolRun) -> String {
        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(html, "<html><head><meta charset=\"utf-8\">");
        let _ = writeln!(html, "<title>{}</title>", escape(&self.title));
        let _ = writeln!(
            html,
            "<style>table{{border-collapse:collapse}}td,th{{border:1px solid #999;padding:4px;vertical-align:top}}pre{{margin:0;white-space:pre-wrap}}</style>"
        );
        let _ = writeln!(html, "</head><body>");
        let _ = writeln!(html, "<h1>{}</h1>", escape(&self.title));
        let _ = writeln!(html, "<p>Generated {}</p>", Utc::now().to_rfc3339());
        let _ = writeln!(
            html,
            "<p>Dispatched: {} | Completed: {} | Cancelled: {} | Skipped: {}</p>",
            run.dispatched,
            run.completed(),
            run.cancelled(),
            run.skipped.len()
        );

        let _ = writeln!(html, "<table>");
        let _ = writeln!(
            html,
            "<tr><th>#</th><th>File</th><th>State</th><th>Findings</th><th>Started</th><th>Elapsed (ms)</th><th>SHA-256</th><th>Details</th></tr>"
        );
        for (idx, task) in run.tasks.iter().enumerate() {
            self.render_row(&mut html, idx + 1, task);
        }
        let _ = writeln!(html, "</table>");

        if !run.skipped.is_empty() {
            let _ = writeln!(html, "<h2>Not analyzed</h2><ul>");
            for path in &run.skipped {
                let _ = writeln!(html, "<li>{}</li>", escape(&self.display(path)));
            }
            let _ = writeln!(html, "</ul>");
        }
        let _ = writeln!(html, "</body></html>");
        html
    }

    fn render_row(&self, html: &mut String, index: usize, task: &AnalysisTask) {
        let findings = task
            .output
            .as_ref()
            .and_then(|o| o.finding_count())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let details = match (&task.error, &task.output) {
            (Some(err), _) => err.clone(),
            (None, Some(output)) => serde_json::to_string_pretty(&output.findings)
                .unwrap_or_else(|_| output.findings.to_string()),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><pre>{}</pre></td></tr>",
            index,
            escape(&self.display(&task.file_path)),
            task.state.as_str(),
            findings,
            escape(task.started_at.as_deref().unwrap_or("-")),
            task.elapsed.as_millis(),
            escape(task.digest.as_deref().unwrap_or("-")),
            escape(&details)
        );
    }

    fn display(&self, path: &Path) -> String {
        self.display_root
            .as_ref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Render and write the report to `path`.
    pub fn write(&self, run: &PoolRun, path: &Path) -> Result<()> {
        let html = self.render(run);
        let report_err = |source| BinmapError::Report { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(report_err)?;
        }
        std::fs::write(path, html).map_err(report_err)?;
        info!(path = %path.display(), rows = run.tasks.len(), "wrote analysis report");
        Ok(())
    }
}

/// Minimal HTML text escaping.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
