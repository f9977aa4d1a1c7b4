//! `JobRunner`: the worker pool that drains the job queue, running
//! `FullDiscoveryWorkflow` to completion with soft/hard timeouts and
//! exponential-backoff retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use lade_core::model::{LeaseId, WorkflowJob};
use lade_core::traits::{CloudLocationRepository, CloudPort, ConfigStore, DedupStore, LeaseRepository};
use lade_engine::workflow::run_full_discovery;

use crate::backoff::RetryPolicy;

/// What happened to a job after one pass through [`JobRunner::process`].
///
/// Exactly two terminal kinds exist, matching [`lade_core::model::JobState`]:
/// `Done` and `FailedTerminal`. A hard timeout with no attempts remaining is
/// a `FailedTerminal`, not a distinct kind — it is still one of the ways a
/// job's retries can be exhausted.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The workflow completed successfully; the dedup key was released.
    Done,
    /// A retryable failure (or a timeout with attempts remaining)
    /// requeued the job at the given attempt number.
    Requeued { attempt: u32 },
    /// Retries are exhausted, the failure is not retryable, or a hard
    /// timeout struck with no attempts left; the dedup key was released
    /// and no further attempt will be made.
    FailedTerminal(String),
}

/// Drives [`lade_engine::workflow::run_full_discovery`] to completion for
/// every job on its queue. Generic over the same traits `lade-engine`'s
/// workflows are, so a single runner type serves both production
/// (`DropboxCloudPort` + `TomlConfigStore` + JSON-file repositories) and
/// tests (`FakeCloudPort` + in-memory fakes).
pub struct JobRunner<C, G, L, Locs, D> {
    cloud: Arc<C>,
    config: Arc<G>,
    leases: Arc<L>,
    locations: Arc<Locs>,
    dedup: Arc<D>,
    sender: async_channel::Sender<WorkflowJob>,
    receiver: async_channel::Receiver<WorkflowJob>,
    retry_policy: RetryPolicy,
    /// Logged once per attempt if exceeded; does not cancel the attempt.
    soft_timeout: Duration,
    /// Cancels the attempt and counts as a (possibly retryable) timeout.
    hard_timeout: Duration,
}

impl<C, G, L, Locs, D> JobRunner<C, G, L, Locs, D>
where
    C: CloudPort + 'static,
    G: ConfigStore + 'static,
    L: LeaseRepository + 'static,
    Locs: CloudLocationRepository + 'static,
    D: DedupStore + 'static,
{
    /// Builds a runner with the default timeouts (soft 90s, hard 120s) and
    /// retry policy over an unbounded in-process queue.
    pub fn new(cloud: Arc<C>, config: Arc<G>, leases: Arc<L>, locations: Arc<Locs>, dedup: Arc<D>) -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self {
            cloud,
            config,
            leases,
            locations,
            dedup,
            sender,
            receiver,
            retry_policy: RetryPolicy::default(),
            soft_timeout: Duration::from_secs(90),
            hard_timeout: Duration::from_secs(120),
        }
    }

    /// Overrides the default retry policy and timeouts, e.g. for faster
    /// tests.
    #[must_use]
    pub fn with_timing(mut self, retry_policy: RetryPolicy, soft_timeout: Duration, hard_timeout: Duration) -> Self {
        self.retry_policy = retry_policy;
        self.soft_timeout = soft_timeout;
        self.hard_timeout = hard_timeout;
        self
    }

    /// A clone of the queue's sender, the handle the write hook enqueues
    /// jobs onto.
    #[must_use]
    pub fn sender(&self) -> async_channel::Sender<WorkflowJob> {
        self.sender.clone()
    }

    /// A clone of the queue's receiver. Exposed so tests can pull a job
    /// off the queue and drive [`JobRunner::process`] directly, one job at
    /// a time, rather than racing a background worker loop.
    #[must_use]
    pub fn receiver(&self) -> async_channel::Receiver<WorkflowJob> {
        self.receiver.clone()
    }

    /// Runs the write-hook trigger against this runner's queue and dedup
    /// store.
    pub async fn trigger(
        &self,
        task_name: &str,
        lease_id: &LeaseId,
        user_id: Option<&str>,
        changed_fields: &[String],
    ) -> bool {
        crate::hook::on_lease_write(self.dedup.as_ref(), &self.sender, task_name, lease_id, user_id, changed_fields)
            .await
    }

    /// Spawns `count` worker tasks, each pulling from the shared queue
    /// until it closes. Returns their join handles so callers can await
    /// shutdown.
    pub fn spawn_workers(self: &Arc<Self>, count: usize) -> Vec<tokio::task::JoinHandle<()>> {
        (0..count)
            .map(|_| {
                let this = Arc::clone(self);
                tokio::spawn(async move { this.run_worker_loop().await })
            })
            .collect()
    }

    async fn run_worker_loop(self: Arc<Self>) {
        while let Ok(job) = self.receiver.recv().await {
            self.process(job).await;
        }
    }

    /// Processes exactly one job through to its next lifecycle transition:
    /// waits for `not_before`, runs the workflow under soft/hard timeouts,
    /// and either releases the dedup key (terminal) or requeues it.
    ///
    /// Exposed directly (not just via [`JobRunner::spawn_workers`]) so
    /// tests can drive one job at a time without racing a background loop.
    #[instrument(skip(self, job), fields(lease_id = %job.lease_id, task = %job.task_name, attempt = job.attempt))]
    pub async fn process(&self, job: WorkflowJob) -> JobOutcome {
        let now = chrono::Utc::now();
        if job.not_before > now {
            if let Ok(wait) = (job.not_before - now).to_std() {
                tokio::time::sleep(wait).await;
            }
        }

        let workflow_fut = run_full_discovery(
            &job.lease_id,
            true,
            self.cloud.as_ref(),
            self.config.as_ref(),
            self.leases.as_ref(),
            self.locations.as_ref(),
        );
        tokio::pin!(workflow_fut);
        let soft_sleep = tokio::time::sleep(self.soft_timeout);
        tokio::pin!(soft_sleep);
        let hard_sleep = tokio::time::sleep(self.hard_timeout);
        tokio::pin!(hard_sleep);
        let mut soft_fired = false;

        let outcome = loop {
            tokio::select! {
                result = &mut workflow_fut => break Some(result),
                () = &mut soft_sleep, if !soft_fired => {
                    soft_fired = true;
                    warn!("soft timeout elapsed, attempt still running");
                }
                () = &mut hard_sleep => break None,
            }
        };

        match outcome {
            Some(Ok(_)) => {
                self.dedup.release(&job.dedup_key).await;
                info!("workflow completed");
                JobOutcome::Done
            }
            Some(Err(err)) => {
                if err.is_retryable() && job.attempt < self.retry_policy.max_attempts {
                    self.requeue(job, &err.to_string()).await
                } else {
                    self.dedup.release(&job.dedup_key).await;
                    error!(error = %err, "job failed terminally");
                    JobOutcome::FailedTerminal(err.to_string())
                }
            }
            None => {
                if job.attempt < self.retry_policy.max_attempts {
                    self.requeue(job, "hard timeout elapsed").await
                } else {
                    self.dedup.release(&job.dedup_key).await;
                    error!("job timed out and exhausted its retries");
                    JobOutcome::FailedTerminal("hard timeout exhausted retries".into())
                }
            }
        }
    }

    async fn requeue(&self, job: WorkflowJob, reason: &str) -> JobOutcome {
        let attempt = job.attempt + 1;
        let delay = self.retry_policy.backoff_for(attempt);
        let not_before = chrono::Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        warn!(%reason, attempt, delay_secs = delay.as_secs(), "requeueing job for retry");
        let next = WorkflowJob { attempt, enqueued_at: chrono::Utc::now(), not_before, ..job };
        if self.sender.send(next).await.is_err() {
            error!("failed to requeue job: channel closed");
        }
        JobOutcome::Requeued { attempt }
    }
}
