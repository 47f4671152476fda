//! Python snippets run in a child interpreter that is killed on timeout.
//!
//! The child gets a closed stdin, a discarded stdout and, on Unix, its own
//! process group plus CPU-time and address-space limits applied before
//! `exec`. The whole group is killed once the interpreter exits or times
//! out, so processes a snippet spawns do not outlive its measurement. These
//! limits bound runaway snippets; they are not an isolation boundary for
//! hostile code.

use super::workload::{ExecutionOutcome, Workload};
use crate::config::MeasureConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for stderr after the group is gone, past the deadline.
const STDERR_GRACE: Duration = Duration::from_millis(100);

static SYSTEM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:import\s+(?:[\w.]+\s*,\s*)*(?:os|sys)\b|from\s+(?:os|sys)\b)").unwrap()
});

/// Reason to refuse measuring `code`, if it imports `os` or `sys`.
pub fn refusal_reason(code: &str) -> Option<String> {
    SYSTEM_IMPORT.find(code).map(|found| {
        format!(
            "Refused: snippet uses '{}'; system modules are not measured",
            found.as_str().trim()
        )
    })
}

/// A Python snippet executed with `<interpreter> -c <code>`.
#[derive(Debug, Clone)]
pub struct PythonProcess {
    interpreter: String,
    code: String,
    memory_limit_mb: Option<u64>,
    working_dir: Option<PathBuf>,
}

impl PythonProcess {
    pub fn new(interpreter: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            code: code.into(),
            memory_limit_mb: None,
            working_dir: None,
        }
    }

    pub fn from_config(config: &MeasureConfig, code: impl Into<String>) -> Self {
        Self::new(config.python.clone(), code).with_memory_limit(config.memory_limit_mb)
    }

    pub fn with_memory_limit(mut self, limit_mb: Option<u64>) -> Self {
        self.memory_limit_mb = limit_mb;
        self
    }

    /// Run the interpreter from `dir` so files the snippet writes land there.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self, timeout: Duration) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .arg("-c")
            .arg(&self.code)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        // Spare second past the deadline; the wall clock normally fires first
        let cpu_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0) + 1;
        let memory_bytes = self.memory_limit_mb.map(|mb| mb.saturating_mul(1024 * 1024));
        apply_limits(&mut command, cpu_secs, memory_bytes);
        command
    }
}

impl Workload for PythonProcess {
    fn label(&self) -> String {
        format!("{} -c <{} bytes>", self.interpreter, self.code.len())
    }

    fn execute(self, timeout: Duration) -> ExecutionOutcome {
        let mut child = match self.command(timeout).spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::Failed(format!(
                    "Failed to start '{}': {e}",
                    self.interpreter
                ))
            }
        };

        let stderr_reader = child.stderr.take().map(|mut pipe| {
            let (sender, receiver) = mpsc::channel();
            thread::spawn(move || {
                let mut captured = String::new();
                let _ = pipe.read_to_string(&mut captured);
                let _ = sender.send(captured);
            });
            receiver
        });

        let deadline = Instant::now() + timeout;
        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                terminate(&mut child);
                tracing::warn!(workload = %self.label(), "Timed out after {:?}; child killed", timeout);
                return ExecutionOutcome::TimedOut;
            }
            Err(e) => {
                terminate(&mut child);
                return ExecutionOutcome::Failed(format!("Failed to wait for interpreter: {e}"));
            }
        };

        // Leftover processes would hold stderr open
        kill_group(&child);
        let stderr = stderr_reader
            .and_then(|reader| {
                let wait = deadline.saturating_duration_since(Instant::now()) + STDERR_GRACE;
                reader.recv_timeout(wait).ok()
            })
            .unwrap_or_default();

        if status.success() {
            ExecutionOutcome::Finished
        } else {
            ExecutionOutcome::Raised(describe_failure(status, &stderr))
        }
    }
}

/// Poll `child` until it exits or `deadline` passes (`Ok(None)`).
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn terminate(child: &mut Child) {
    kill_group(child);
    if let Err(e) = child.kill() {
        tracing::debug!("Kill failed (child may have exited): {e}");
    }
    let _ = child.wait();
}

/// SIGKILL every process left in the child's group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions. The group id is
    // the child's pid, set by `process_group(0)` before exec.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        tracing::trace!(
            "No process group left to kill: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Last non-empty stderr line (the Python exception), else the status.
fn describe_failure(status: ExitStatus, stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("interpreter exited with {status}"))
}

#[cfg(unix)]
fn apply_limits(command: &mut Command, cpu_secs: u64, memory_bytes: Option<u64>) {
    use std::os::unix::process::CommandExt;

    macro_rules! lower_limit {
        ($resource:expr, $value:expr) => {{
            let mut limit = libc::rlimit {
                rlim_cur: 0,
                rlim_max: 0,
            };
            if libc::getrlimit($resource, &mut limit) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            limit.rlim_cur = ($value as libc::rlim_t).min(limit.rlim_max);
            if libc::setrlimit($resource, &limit) != 0 {
                return Err(std::io::Error::last_os_error());
            }
        }};
    }

    command.process_group(0);

    // SAFETY: the hook only calls getrlimit/setrlimit, which are
    // async-signal-safe, between fork and exec.
    unsafe {
        command.pre_exec(move || {
            lower_limit!(libc::RLIMIT_CPU, cpu_secs);
            if let Some(bytes) = memory_bytes {
                lower_limit!(libc::RLIMIT_AS, bytes);
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn apply_limits(_command: &mut Command, _cpu_secs: u64, _memory_bytes: Option<u64>) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> Option<String> {
        which::which("python3")
            .ok()
            .map(|path| path.to_string_lossy().into_owned())
    }

    #[test]
    fn test_refusal_reason() {
        assert!(refusal_reason("import os\nos.system('ls')").is_some());
        assert!(refusal_reason("import json, sys").is_some());
        assert!(refusal_reason("from os import path").is_some());
        assert!(refusal_reason("import os.path").is_some());
        assert!(refusal_reason("import osmnx\nx = 1").is_none());
        assert!(refusal_reason("total = sum(i for i in range(10))").is_none());
    }

    #[test]
    fn test_describe_failure_prefers_last_stderr_line() {
        let status = std::process::Command::new("false")
            .status()
            .unwrap_or_else(|_| ExitStatus::default());
        let stderr = "Traceback (most recent call last):\n  File \"<string>\", line 1\nZeroDivisionError: division by zero\n\n";
        assert_eq!(
            describe_failure(status, stderr),
            "ZeroDivisionError: division by zero"
        );
        assert!(describe_failure(status, "").starts_with("interpreter exited with"));
    }

    #[test]
    fn test_missing_interpreter_fails() {
        let outcome = PythonProcess::new("definitely-not-a-python-binary", "x = 1")
            .execute(Duration::from_secs(1));
        assert!(matches!(outcome, ExecutionOutcome::Failed(ref msg) if msg.contains("Failed to start")));
    }

    #[test]
    fn test_trivial_snippet_finishes() {
        let Some(python) = python() else { return };
        let outcome = PythonProcess::new(python, "x = 1").execute(Duration::from_secs(10));
        assert_eq!(outcome, ExecutionOutcome::Finished);
    }

    #[test]
    fn test_exception_is_reported() {
        let Some(python) = python() else { return };
        let outcome = PythonProcess::new(python, "1 / 0").execute(Duration::from_secs(10));
        assert_eq!(
            outcome,
            ExecutionOutcome::Raised("ZeroDivisionError: division by zero".to_string())
        );
    }

    #[test]
    fn test_working_dir_receives_written_files() {
        let Some(python) = python() else { return };
        let dir = tempfile::TempDir::new().unwrap();
        let outcome = PythonProcess::new(python, "open('out.txt', 'w').write('x')")
            .with_working_dir(dir.path())
            .execute(Duration::from_secs(10));

        assert_eq!(outcome, ExecutionOutcome::Finished);
        assert!(dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_infinite_loop_is_killed() {
        let Some(python) = python() else { return };
        let started = Instant::now();
        let outcome = PythonProcess::new(python, "while True: pass")
            .with_memory_limit(Some(1024))
            .execute(Duration::from_millis(500));

        assert_eq!(outcome, ExecutionOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_background_child_does_not_extend_the_wait() {
        let Some(python) = python() else { return };
        let code = "import subprocess, sys\n\
                    subprocess.Popen([sys.executable, '-c', 'import time; time.sleep(4)'])";
        let started = Instant::now();
        let outcome = PythonProcess::new(python, code).execute(Duration::from_secs(2));

        assert_eq!(outcome, ExecutionOutcome::Finished);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_kills_spawned_processes() {
        let Some(python) = python() else { return };
        let dir = tempfile::TempDir::new().unwrap();
        let code = "import subprocess, sys\n\
                    subprocess.Popen([sys.executable, '-c', \
                    \"import time; time.sleep(1); open('late.txt', 'w').write('x')\"])\n\
                    while True: pass";
        let outcome = PythonProcess::new(python, code)
            .with_working_dir(dir.path())
            .execute(Duration::from_millis(500));
        assert_eq!(outcome, ExecutionOutcome::TimedOut);

        thread::sleep(Duration::from_millis(1500));
        assert!(!dir.path().join("late.txt").exists());
    }
}
