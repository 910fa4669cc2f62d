#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use binmap_core::analysis::{
    AnalysisWorkerPool, Analyzer, CancelToken, ExternalAnalyzer, TaskState,
};
use binmap_core::config::PoolConfig;
use binmap_core::BinmapError;
use tempfile::tempdir;

/// Runs `script` through `sh -c`; the analyzed file arrives as `$1`.
fn shell(script: &str) -> ExternalAnalyzer {
    ExternalAnalyzer {
        program: PathBuf::from("sh"),
        args: vec!["-c".into(), script.into(), "sh".into()],
        poll_interval: Duration::from_millis(20),
    }
}

fn input() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let file = dir.path().join("module.py");
    fs::write(&file, "[{\"symbol\": \"unused-import\"}, {\"symbol\": \"line-too-long\"}]").unwrap();
    (dir, file)
}

#[test]
fn json_array_on_stdout_becomes_findings() {
    let (_dir, file) = input();
    let output = shell("cat \"$1\"").analyze(&file, &CancelToken::new()).unwrap();

    assert_eq!(output.tool, "sh");
    assert_eq!(output.exit_code, Some(0));
    assert_eq!(output.finding_count(), Some(2));
    assert_eq!(output.findings[0]["symbol"], "unused-import");
}

#[test]
fn message_exit_bits_are_not_failures() {
    let (_dir, file) = input();
    let output = shell("echo '[]'; exit 4").analyze(&file, &CancelToken::new()).unwrap();

    assert_eq!(output.exit_code, Some(4));
    assert_eq!(output.finding_count(), Some(0));
}

#[test]
fn fatal_and_usage_exit_bits_are_failures() {
    let (_dir, file) = input();
    for code in [1, 32, 33] {
        let err = shell(&format!("echo boom >&2; exit {code}"))
            .analyze(&file, &CancelToken::new())
            .unwrap_err();
        match err {
            BinmapError::AnalysisTask { path, reason } => {
                assert_eq!(path, file);
                assert!(reason.contains("boom"), "{reason}");
            }
            other => panic!("unexpected error for exit {code}: {other}"),
        }
    }
}

#[test]
fn non_json_stdout_is_kept_as_text() {
    let (_dir, file) = input();
    let output = shell("echo 'module.py:1:0: C0114 missing docstring'")
        .analyze(&file, &CancelToken::new())
        .unwrap();

    assert_eq!(
        output.findings,
        serde_json::Value::String("module.py:1:0: C0114 missing docstring\n".into())
    );
    assert_eq!(output.finding_count(), None);
}

#[test]
fn missing_program_is_a_task_error() {
    let (dir, file) = input();
    let analyzer = ExternalAnalyzer {
        program: dir.path().join("no-such-linter"),
        args: Vec::new(),
        poll_interval: Duration::from_millis(20),
    };
    let err = analyzer.analyze(&file, &CancelToken::new()).unwrap_err();

    assert!(
        matches!(&err, BinmapError::AnalysisTask { reason, .. } if reason.contains("failed to spawn")),
        "unexpected error: {err}"
    );
}

#[test]
fn cancellation_stops_a_running_linter() {
    let (_dir, file) = input();
    let token = CancelToken::new();
    let canceller = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            token.cancel();
        })
    };

    let started = Instant::now();
    let err = shell("sleep 30").analyze(&file, &token).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, BinmapError::Cancelled(_)), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn leftover_background_process_does_not_outlive_the_task_timeout() {
    let (_dir, file) = input();
    let analyzer = shell("sleep 30 & echo '[]'");
    let pool = AnalysisWorkerPool::new(
        &analyzer,
        &PoolConfig { concurrency: 1, max_dispatch: 20, task_timeout_secs: 1 },
    );

    let started = Instant::now();
    let run = pool.run(&[file]);

    assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
    let task = &run.tasks[0];
    assert_eq!(task.state, TaskState::Completed);
    assert!(task.error.is_none(), "{:?}", task.error);
    assert_eq!(task.output.as_ref().and_then(|o| o.finding_count()), Some(0));
}
