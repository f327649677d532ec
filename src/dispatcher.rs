//! Fixed-size worker pool that drives inserts against a backend
//!
//! ```text
//!   producer ──► job queue (bounded, capacity = jobs) ──► worker 1..N ──► Backend::insert
//!                                                              │
//!   orchestrator ◄──────── completion queue (one signal per job) ◄┘
//! ```
//!
//! The producer enqueues every token up front and closes the queue. Workers
//! race to dequeue; each token reaches exactly one worker. A worker leaves its
//! loop once the queue is closed and drained. The orchestrator returns after
//! it has seen one completion per enqueued token, failed inserts included.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Semaphore, mpsc, watch};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::backend::Backend;

/// One unit of benchmark work: a fresh, globally unique key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobToken(String);

impl JobToken {
    pub fn generate() -> Self {
        JobToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion signal pushed by a worker after each job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Written,
    Failed,
}

/// Summary of a finished (or cancelled) run
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Tokens the producer put on the queue
    pub enqueued: usize,
    /// Completion signals received, failures included
    pub completed: usize,
    /// Jobs whose insert returned an error
    pub failed: usize,
    /// Whether the run stopped early on a shutdown request
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl DispatchReport {
    /// Completed jobs per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }
}

/// Runs `total_jobs` inserts across `pool_size` workers
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    pool_size: usize,
    total_jobs: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, pool_size: usize, total_jobs: usize) -> Self {
        if pool_size == 0 {
            warn!("pool size of 0 requested, running with a single worker");
        }

        Self {
            backend,
            pool_size: pool_size.max(1),
            total_jobs,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn total_jobs(&self) -> usize {
        self.total_jobs
    }

    /// Run every job to completion
    pub async fn run(&self) -> DispatchReport {
        self.run_until(std::future::pending()).await
    }

    /// Run every job, or stop early once `shutdown` resolves.
    ///
    /// On shutdown the producer stops enqueueing and workers finish the insert
    /// they are executing, then exit. Tokens still queued are dropped.
    #[instrument(skip_all, fields(workers = self.pool_size, jobs = self.total_jobs))]
    pub async fn run_until<F>(&self, shutdown: F) -> DispatchReport
    where
        F: Future<Output = ()> + Send,
    {
        let started_at = Utc::now();
        let start = Instant::now();

        // tokio channels take between 1 and MAX_PERMITS slots
        let capacity = self.total_jobs.clamp(1, Semaphore::MAX_PERMITS);
        let (job_tx, job_rx) = mpsc::channel::<JobToken>(capacity);
        let (done_tx, mut done_rx) = mpsc::channel::<JobOutcome>(capacity);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let jobs = Arc::new(Mutex::new(job_rx));
        let workers: Vec<_> = (1..=self.pool_size)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    jobs.clone(),
                    self.backend.clone(),
                    done_tx.clone(),
                    cancel_rx.clone(),
                ))
            })
            .collect();
        // Workers hold the only senders, so the completion queue closes once they all exit
        drop(done_tx);

        tokio::pin!(shutdown);
        let mut cancelled = false;

        let mut enqueued = 0;
        while enqueued < self.total_jobs {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    cancelled = true;
                    break;
                }
                sent = job_tx.send(JobToken::generate()) => {
                    if sent.is_err() {
                        warn!("job queue closed after {enqueued} jobs");
                        break;
                    }
                    enqueued += 1;
                }
            }
        }
        drop(job_tx);
        debug!("enqueued {enqueued} jobs, queue closed");

        if cancelled {
            info!("shutdown requested, stopping workers");
            let _ = cancel_tx.send(true);
        }

        let mut completed = 0;
        let mut failed = 0;
        while completed < enqueued {
            let next = if cancelled {
                done_rx.recv().await
            } else {
                tokio::select! {
                    next = done_rx.recv() => next,
                    _ = &mut shutdown => {
                        info!("shutdown requested, stopping workers");
                        cancelled = true;
                        let _ = cancel_tx.send(true);
                        continue;
                    }
                }
            };

            match next {
                Some(outcome) => {
                    completed += 1;
                    if outcome == JobOutcome::Failed {
                        failed += 1;
                    }
                }
                None => break,
            }
        }

        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                warn!("worker task failed: {e}");
            }
        }

        let report = DispatchReport {
            enqueued,
            completed,
            failed,
            cancelled,
            started_at,
            elapsed: start.elapsed(),
        };

        debug!(
            "{} of {} jobs completed ({} failed) in {:.2?}, {:.1} jobs/s",
            report.completed,
            report.enqueued,
            report.failed,
            report.elapsed,
            report.throughput()
        );

        report
    }
}

/// Worker loop: dequeue, insert, signal, until the queue is closed and drained
#[instrument(level = "debug", skip_all, fields(worker = id))]
async fn worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<JobToken>>>,
    backend: Arc<dyn Backend>,
    done: mpsc::Sender<JobOutcome>,
    cancel: watch::Receiver<bool>,
) {
    trace!("worker {id} idle");

    loop {
        if *cancel.borrow() {
            debug!("worker {id} cancelled");
            break;
        }

        let token = {
            let mut queue = jobs.lock().await;
            queue.recv().await
        };

        let Some(token) = token else {
            break;
        };

        if *cancel.borrow() {
            break;
        }

        let outcome = match backend.insert(token.as_str()).await {
            Ok(()) => JobOutcome::Written,
            Err(e) => {
                // counted by the backend; logging every failure would flood the output
                debug!("worker {id}: dropping job {token}: {e}");
                JobOutcome::Failed
            }
        };

        if done.send(outcome).await.is_err() {
            debug!("worker {id}: completion queue closed");
            break;
        }
    }

    trace!("worker {id} exited");
}
