//! Single-slot background workers.
//!
//! A [`SerialWorker`] owns one tokio task that drains a bounded queue and runs
//! each job to completion before taking the next one. Jobs therefore execute
//! one at a time, in submission order. The downloader keeps two of them, one
//! for network fetches and one for disk writes, so a slow write never holds
//! up a fetch and vice versa.

use crate::error::{Error, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::{mpsc, oneshot};

type Job = BoxFuture<'static, ()>;

/// Handle to a single-slot FIFO worker (cloneable, all clones feed the same queue)
#[derive(Clone)]
pub struct SerialWorker {
    name: &'static str,
    sender: mpsc::Sender<Job>,
}

impl SerialWorker {
    /// Spawn the worker loop on the current tokio runtime
    ///
    /// `queue_capacity` bounds how many jobs may wait behind the running one.
    /// The loop exits once every handle has been dropped and the queue is drained.
    pub fn spawn(name: &'static str, queue_capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Job>(queue_capacity.max(1));

        tokio::spawn(async move {
            tracing::debug!(worker = name, "worker started");
            while let Some(job) = receiver.recv().await {
                if AssertUnwindSafe(job).catch_unwind().await.is_err() {
                    tracing::error!(worker = name, "job panicked, continuing with next job");
                }
            }
            tracing::debug!(worker = name, "worker stopped");
        });

        Self { name, sender }
    }

    /// Worker name, used in logs and errors
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queue `task` and wait for its output
    ///
    /// Waits for queue space if the worker is backed up. Fails with
    /// [`Error::WorkerUnavailable`] if the worker loop is gone or the task panicked.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let output = task.await;
            // Caller may have gone away; the work is done either way
            let _ = result_tx.send(output);
        });

        self.sender
            .send(job)
            .await
            .map_err(|_| Error::WorkerUnavailable { worker: self.name })?;

        result_rx
            .await
            .map_err(|_| Error::WorkerUnavailable { worker: self.name })
    }
}
