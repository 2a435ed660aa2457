//! Message-based background worker.
//!
//! The contract between the engine and an interactive caller is submit a
//! job, receive a result or error asynchronously — never a
//! shared-mutable-state call. Within one job processing is strictly
//! sequential; jobs observe their cancellation token cooperatively and a
//! cancelled job reports `Cancelled` with partial results discarded.

use std::sync::mpsc;
use std::thread;

use survbench_ingest::CancelToken;
use survbench_model::{BenchError, Result};

/// Terminal state of a submitted job.
#[derive(Debug)]
pub enum JobOutcome<T> {
    Finished(T),
    /// Cancellation is a distinct outcome, not an error: incomplete, no
    /// result.
    Cancelled,
}

/// Receiving end of one submitted job.
pub struct JobHandle<T> {
    receiver: mpsc::Receiver<Result<JobOutcome<T>>>,
    cancel: CancelToken,
}

impl<T> JobHandle<T> {
    /// Request cooperative cancellation of the running job.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the job reports its outcome.
    ///
    /// # Errors
    ///
    /// The job's own error, or `Validation` when the worker disappeared
    /// without reporting.
    pub fn wait(self) -> Result<JobOutcome<T>> {
        self.receiver
            .recv()
            .map_err(|_| BenchError::validation("worker dropped the job"))?
    }

    /// Non-blocking poll; `None` while the job is still running.
    pub fn try_wait(&self) -> Option<Result<JobOutcome<T>>> {
        self.receiver.try_recv().ok()
    }
}

/// Spawns one thread per submitted job and reports over a channel.
///
/// Jobs receive their cancellation token and are expected to check it at
/// batch/group boundaries, returning [`JobOutcome::Cancelled`] when it has
/// fired.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsWorker;

impl StatsWorker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Submit a job for background execution.
    pub fn submit<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> Result<JobOutcome<T>> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        thread::spawn(move || {
            let outcome = job(&token);
            // The caller may have dropped the handle; nothing to do then.
            let _ = sender.send(outcome);
        });
        JobHandle { receiver, cancel }
    }
}
