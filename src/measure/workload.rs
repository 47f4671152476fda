//! Units of work the measurer can time.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How a workload ended, as seen by the measurer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Finished,
    /// Ran to the end but reported an error
    Raised(String),
    TimedOut,
    /// Could not be run at all
    Failed(String),
}

/// Work that runs to completion or until `timeout` expires, whichever
/// comes first. Implementations decide what happens to work that is still
/// running when the time is up.
pub trait Workload {
    fn label(&self) -> String;

    fn execute(self, timeout: Duration) -> ExecutionOutcome;
}

/// A closure run on its own detached thread.
///
/// A thread cannot be killed from outside: on timeout it is abandoned and
/// keeps running until it returns on its own. Detached threads do not keep
/// the process alive at exit.
pub struct ThreadWorkload<F> {
    label: String,
    task: F,
}

impl<F> ThreadWorkload<F>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    pub fn new(label: impl Into<String>, task: F) -> Self {
        Self {
            label: label.into(),
            task,
        }
    }
}

impl<F> Workload for ThreadWorkload<F>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    fn label(&self) -> String {
        self.label.clone()
    }

    fn execute(self, timeout: Duration) -> ExecutionOutcome {
        let (tx, rx) = mpsc::channel();
        let task = self.task;

        let spawned = thread::Builder::new()
            .name("greenmap-measure".to_string())
            .spawn(move || {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
                    Ok(Ok(())) => ExecutionOutcome::Finished,
                    Ok(Err(e)) => ExecutionOutcome::Raised(format!("{e:#}")),
                    Err(payload) => ExecutionOutcome::Raised(panic_message(payload.as_ref())),
                };
                // The receiver is gone when the caller already timed out
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            return ExecutionOutcome::Failed(format!("Failed to spawn worker thread: {e}"));
        }

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    workload = %self.label,
                    "Timed out after {:?}; abandoning worker thread",
                    timeout
                );
                ExecutionOutcome::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                ExecutionOutcome::Raised("worker exited without reporting".to_string())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_finished() {
        let outcome = ThreadWorkload::new("noop", || Ok(())).execute(Duration::from_secs(5));
        assert_eq!(outcome, ExecutionOutcome::Finished);
    }

    #[test]
    fn test_error_is_reported_not_swallowed() {
        let outcome = ThreadWorkload::new("fails", || Err(anyhow::anyhow!("division by zero")))
            .execute(Duration::from_secs(5));
        assert_eq!(
            outcome,
            ExecutionOutcome::Raised("division by zero".to_string())
        );
    }

    #[test]
    fn test_panic_is_caught() {
        let outcome = ThreadWorkload::new("panics", || -> anyhow::Result<()> {
            panic!("boom");
        })
        .execute(Duration::from_secs(5));
        assert_eq!(outcome, ExecutionOutcome::Raised("panicked: boom".to_string()));
    }

    #[test]
    fn test_timeout_returns_promptly() {
        let started = Instant::now();
        let outcome = ThreadWorkload::new("sleeper", || {
            thread::sleep(Duration::from_secs(3));
            Ok(())
        })
        .execute(Duration::from_millis(100));

        assert_eq!(outcome, ExecutionOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
