//! Concurrent fact gathering with complete error reporting
//!
//! One worker runs per item on a scoped thread. A failing worker does not hide the
//! others: every failure is collected and reported together once all workers joined.

use log::debug;
use std::fmt;
use std::thread;
use thiserror::Error;

/// Failure of a single worker
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Deliberate early abort; fails the run without a report entry
    #[error("worker aborted")]
    Ignorable,

    #[error("{0}")]
    Failed(String),
}

impl WorkerError {
    pub fn failed(msg: impl fmt::Display) -> Self {
        WorkerError::Failed(msg.to_string())
    }
}

/// All failures of one run
#[derive(Debug, Default)]
pub struct WorkerFailures {
    pub messages: Vec<String>,
    /// Number of workers that aborted through [`WorkerError::Ignorable`]
    pub aborted: usize,
}

impl fmt::Display for WorkerFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return write!(f, "{} worker(s) aborted", self.aborted);
        }
        for (i, msg) in self.messages.iter().enumerate() {
            writeln!(f, "Exception {i}: {}", msg.trim())?;
        }
        Ok(())
    }
}

impl std::error::Error for WorkerFailures {}

/// Run `worker` once per item in parallel and collect the results in item order
pub fn run_all<I, T, F>(items: Vec<I>, worker: F) -> Result<Vec<T>, WorkerFailures>
where
    I: Send,
    T: Send,
    F: Fn(I) -> Result<T, WorkerError> + Sync,
{
    let total = items.len();
    let outcomes: Vec<Result<T, WorkerError>> = thread::scope(|s| {
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let worker = &worker;
                s.spawn(move || worker(item))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(WorkerError::failed("worker panicked")))
            })
            .collect()
    });

    let mut results = Vec::with_capacity(total);
    let mut failures = WorkerFailures::default();
    for outcome in outcomes {
        match outcome {
            Ok(value) => results.push(value),
            Err(WorkerError::Ignorable) => failures.aborted += 1,
            Err(WorkerError::Failed(msg)) => failures.messages.push(msg),
        }
    }

    if failures.messages.is_empty() && failures.aborted == 0 {
        debug!("gathered results from {total} worker(s)");
        Ok(results)
    } else {
        Err(failures)
    }
}
