//! Static-analysis seam: the per-file analyzer, its cancellation token, and
//! the bounded worker pool that drives it.

pub mod pool;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::{BinmapError, Result};

pub use pool::{AnalysisTask, AnalysisWorkerPool, PoolRun, TaskState};

/// Cooperative cancellation: a shared flag plus an optional deadline.
///
/// Nothing is ever interrupted from outside; workers check the token at
/// their own checkpoints and report `Cancelled` themselves.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation for this token and every token derived from it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.timed_out()
    }

    pub fn timed_out(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    /// Derive a token sharing this flag, with a deadline `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self { flag: Arc::clone(&self.flag), deadline: timeout.map(|t| Instant::now() + t) }
    }
}

/// Opaque per-file analyzer output, embedded as-is in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub tool: String,
    pub findings: serde_json::Value,
    pub exit_code: Option<i32>,
}

impl AnalysisOutput {
    /// Number of findings when the tool emitted a JSON array.
    pub fn finding_count(&self) -> Option<usize> {
        self.findings.as_array().map(Vec::len)
    }
}

/// Trait implemented by single-file analyzers.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, file: &Path, token: &CancelToken) -> Result<AnalysisOutput>;
    fn name(&self) -> &'static str;
}

/// Analyzer that shells out to an external linter, one file per process.
pub struct ExternalAnalyzer {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub poll_interval: Duration,
}

/// Exit-status bits that mean the linter itself failed (fatal, usage error).
const FAILURE_EXIT_BITS: i32 = 1 | 32;

impl ExternalAnalyzer {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            args: config.args.clone(),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl Analyzer for ExternalAnalyzer {
    fn analyze(&self, file: &Path, token: &CancelToken) -> Result<AnalysisOutput> {
        let task_err = |reason: String| BinmapError::AnalysisTask { path: file.to_path_buf(), reason };

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|e| task_err(format!("failed to spawn {}: {e}", self.program.display())))?;

        let (tx, rx) = mpsc::channel();
        let mut pending = 0;
        if let Some(pipe) = child.stdout.take() {
            drain(pipe, Stream::Stdout, tx.clone());
            pending += 1;
        }
        if let Some(pipe) = child.stderr.take() {
            drain(pipe, Stream::Stderr, tx.clone());
            pending += 1;
        }
        drop(tx);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if token.is_cancelled() => {
                    stop(&mut child);
                    debug!(file = %file.display(), "analyzer process stopped on cancellation");
                    return Err(BinmapError::Cancelled(file.to_path_buf()));
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    stop(&mut child);
                    return Err(task_err(format!("failed to wait on analyzer: {e}")));
                }
            }
        };

        // Processes the linter left behind can hold its pipes open after it exits.
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut grace_until: Option<Instant> = None;
        while pending > 0 {
            match rx.recv_timeout(self.poll_interval) {
                Ok((Stream::Stdout, text)) => {
                    stdout = text;
                    pending -= 1;
                }
                Ok((Stream::Stderr, text)) => {
                    stderr = text;
                    pending -= 1;
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => match grace_until {
                    None if token.is_cancelled() => {
                        warn!(
                            file = %file.display(),
                            "analyzer exited but its output is still held open; stopping leftover processes"
                        );
                        kill_group(&child);
                        grace_until = Some(Instant::now() + DRAIN_GRACE);
                    }
                    Some(until) if Instant::now() >= until => {
                        warn!(file = %file.display(), "analyzer output incomplete after stopping leftover processes");
                        break;
                    }
                    _ => {}
                },
            }
        }

        let code = status.code();
        match code {
            Some(c) if c & FAILURE_EXIT_BITS != 0 => {
                return Err(task_err(format!("exited with {status}: {}", stderr.trim())));
            }
            None => return Err(task_err(format!("terminated by signal: {}", stderr.trim()))),
            _ => {}
        }

        let findings = serde_json::from_str(&stdout)
            .unwrap_or_else(|_| serde_json::Value::String(stdout.clone()));
        Ok(AnalysisOutput {
            tool: self.program.display().to_string(),
            findings,
            exit_code: code,
        })
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

/// How long to wait for output after leftover processes are killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Kill the analyzer and everything in its process group, then reap it.
fn stop(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Pick the analysis inputs out of a path list.
///
/// Paths are resolved against `source_root`; entries with an extension the
/// analyzer does not handle are logged and left out.
pub fn select_inputs<S: AsRef<str>>(
    paths: &[S],
    source_root: &Path,
    config: &AnalyzerConfig,
) -> Vec<PathBuf> {
    let mut selected = Vec::new();
    for raw in paths {
        let raw = raw.as_ref();
        let path = source_root.join(raw);
        if config.accepts(&path) {
            selected.push(path);
        } else {
            info!(path = %raw, "not an analysis input; ignoring");
        }
    }
    selected
}
