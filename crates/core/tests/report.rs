use std::path::PathBuf;
use std::time::Duration;

use binmap_core::analysis::{AnalysisOutput, AnalysisTask, PoolRun, TaskState};
use binmap_core::report::{escape, ReportRenderer};
use binmap_core::BinmapError;
use tempfile::tempdir;

fn task(path: &str, state: TaskState, output: Option<AnalysisOutput>, error: Option<&str>) -> AnalysisTask {
    AnalysisTask {
        file_path: PathBuf::from(path),
        state,
        output,
        error: error.map(str::to_string),
        started_at: Some("2026-01-01T00:00:00+00:00".into()),
        elapsed: Duration::from_millis(42),
        digest: None,
    }
}

fn sample_run() -> PoolRun {
    PoolRun {
        tasks: vec![
            task(
                "/src/Automation/Server/b.py",
                TaskState::Completed,
                Some(AnalysisOutput {
                    tool: "pylint".into(),
                    findings: serde_json::json!([{ "message": "Unused import <os>", "line": 3 }]),
                    exit_code: Some(4),
                }),
                None,
            ),
            task("/src/Automation/Server/a.py", TaskState::Completed, None, Some("syntax error")),
            task("/src/Automation/Server/c.py", TaskState::Cancelled, None, None),
        ],
        skipped: vec![PathBuf::from("/src/Automation/Server/z.py")],
        dispatched: 3,
        peak_running: 2,
    }
}

#[test]
fn report_lists_tasks_in_completion_order_with_escaped_findings() {
    let html = ReportRenderer::default().with_display_root("/src").render(&sample_run());

    let b = html.find("Automation/Server/b.py").unwrap();
    let a = html.find("Automation/Server/a.py").unwrap();
    let c = html.find("Automation/Server/c.py").unwrap();
    assert!(b < a && a < c);

    assert!(html.contains("Unused import &lt;os&gt;"));
    assert!(!html.contains("<os>"));
    assert!(html.contains("syntax error"));
    assert!(html.contains("cancelled"));
    assert!(html.contains("Not analyzed"));
    assert!(html.contains("Automation/Server/z.py"));
    assert!(!html.contains("/src/Automation"));
}

#[test]
fn report_is_written_to_requested_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/cvlintoutput.html");
    ReportRenderer::default().write(&sample_run(), &path).unwrap();
    let body = std::fs::read_to_string(&path).unwrap();
    assert!(body.starts_with("<!DOCTYPE html>"));
}

#[test]
fn unwritable_report_is_report_error() {
    let dir = tempdir().unwrap();
    // A directory where the file should be.
    let path = dir.path().join("cvlintoutput.html");
    std::fs::create_dir_all(&path).unwrap();
    let err = ReportRenderer::default().write(&sample_run(), &path).unwrap_err();
    assert!(matches!(err, BinmapError::Report { .. }), "unexpected error: {err}");
}

#[test]
fn escape_handles_markup_characters() {
    assert_eq!(escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
}
