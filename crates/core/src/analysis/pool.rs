//! Bounded-concurrency analysis runner.
//!
//! At most `concurrency` tasks run at once, gated by a channel pre-filled with
//! that many permits. At most `max_dispatch` tasks are started per run; the
//! rest are reported as skipped. Workers are scoped threads, so every task
//! has reached a terminal state when [`AnalysisWorkerPool::run`] returns.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{AnalysisOutput, Analyzer, CancelToken};
use crate::config::PoolConfig;
use crate::error::BinmapError;
use crate::util::sha256_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

/// One file's analysis. A failed analysis is `Completed` with `error` set.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTask {
    pub file_path: PathBuf,
    pub state: TaskState,
    pub output: Option<AnalysisOutput>,
    pub error: Option<String>,
    pub started_at: Option<String>,
    pub elapsed: Duration,
    pub digest: Option<String>,
}

impl AnalysisTask {
    fn pending(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            state: TaskState::Pending,
            output: None,
            error: None,
            started_at: None,
            elapsed: Duration::ZERO,
            digest: None,
        }
    }
}

/// Result of one pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolRun {
    /// Terminal tasks in completion order.
    pub tasks: Vec<AnalysisTask>,
    /// Inputs never dispatched because the dispatch ceiling was reached.
    pub skipped: Vec<PathBuf>,
    pub dispatched: usize,
    /// Highest number of running tasks seen right after a dispatch.
    pub peak_running: usize,
}

impl PoolRun {
    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|t| t.state == TaskState::Completed).count()
    }

    pub fn cancelled(&self) -> usize {
        self.tasks.iter().filter(|t| t.state == TaskState::Cancelled).count()
    }
}

/// Returns its slot to the dispatcher when dropped, including on unwind.
struct Permit(Sender<()>);

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

pub struct AnalysisWorkerPool<'a> {
    analyzer: &'a dyn Analyzer,
    concurrency: usize,
    max_dispatch: usize,
    task_timeout: Option<Duration>,
    cancel: CancelToken,
}

impl<'a> AnalysisWorkerPool<'a> {
    pub fn new(analyzer: &'a dyn Analyzer, config: &PoolConfig) -> Self {
        Self {
            analyzer,
            concurrency: config.concurrency.max(1),
            max_dispatch: config.max_dispatch,
            task_timeout: config.task_timeout(),
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally owned token so callers can cancel a run in progress.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Analyze `files` in input order, bounded by the pool limits.
    pub fn run(&self, files: &[PathBuf]) -> PoolRun {
        let (release, acquire) = mpsc::channel::<()>();
        for _ in 0..self.concurrency {
            let _ = release.send(());
        }

        let results: Mutex<Vec<AnalysisTask>> = Mutex::new(Vec::with_capacity(files.len()));
        let running = AtomicUsize::new(0);
        let mut run = PoolRun::default();

        thread::scope(|scope| {
            for (idx, file) in files.iter().enumerate() {
                if run.dispatched >= self.max_dispatch {
                    for rest in &files[idx..] {
                        warn!(
                            file = %rest.display(),
                            limit = self.max_dispatch,
                            "dispatch ceiling reached; file not analyzed"
                        );
                        run.skipped.push(rest.clone());
                    }
                    break;
                }

                // Blocks while every permit is held by a running task.
                if acquire.recv().is_err() {
                    break;
                }
                let permit = Permit(release.clone());

                let now_running = running.fetch_add(1, Ordering::SeqCst) + 1;
                run.dispatched += 1;
                run.peak_running = run.peak_running.max(now_running);
                info!(
                    file = %file.display(),
                    dispatched = run.dispatched,
                    running = now_running,
                    "dispatching analysis task"
                );

                let token = self.cancel.child_with_timeout(self.task_timeout);
                let analyzer = self.analyzer;
                let results = &results;
                let running = &running;
                scope.spawn(move || {
                    let _permit = permit;
                    let task = run_task(analyzer, file, &token);
                    running.fetch_sub(1, Ordering::SeqCst);
                    let mut guard = results.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    guard.push(task);
                });
            }
        });

        run.tasks = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(
            dispatched = run.dispatched,
            completed = run.completed(),
            cancelled = run.cancelled(),
            skipped = run.skipped.len(),
            "analysis pool finished"
        );
        run
    }
}

fn run_task(analyzer: &dyn Analyzer, file: &Path, token: &CancelToken) -> AnalysisTask {
    let mut task = AnalysisTask::pending(file);
    task.state = TaskState::Running;
    task.started_at = Some(Utc::now().to_rfc3339());
    let start = Instant::now();

    if token.is_cancelled() {
        task.state = TaskState::Cancelled;
        debug!(file = %file.display(), "task cancelled before start");
        return task;
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(file, token)));
    task.elapsed = start.elapsed();

    match outcome {
        Ok(Ok(output)) => {
            task.state = TaskState::Completed;
            task.output = Some(output);
        }
        Ok(Err(BinmapError::Cancelled(_))) => task.state = TaskState::Cancelled,
        Ok(Err(err)) => {
            warn!(file = %file.display(), error = %err, "analysis task failed");
            task.state = TaskState::Completed;
            task.error = Some(err.to_string());
        }
        Err(_) => {
            warn!(file = %file.display(), "analyzer panicked");
            task.state = TaskState::Completed;
            task.error = Some(format!("analyzer {} panicked", analyzer.name()));
        }
    }

    if task.state == TaskState::Cancelled && token.timed_out() {
        task.error = Some(format!("timed out after {:.1}s", task.elapsed.as_secs_f64()));
    }
    if task.state == TaskState::Completed {
        task.digest = sha256_file(file).ok();
    }
    debug!(
        file = %file.display(),
        state = task.state.as_str(),
        elapsed_ms = task.elapsed.as_millis() as u64,
        "task finished"
    );
    task
}
