//! Periodic status polling for one job.
//!
//! Each adopted job gets its own spawned task. The task waits one period,
//! fetches the status, hands the response to a [`StatusSink`], and repeats
//! until the sink says stop or the task's [`CancellationToken`] fires.
//! Fetches are issued strictly one after another, so at most one status
//! request per job is ever outstanding.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use syncavatar_client::backend::JobBackend;
use syncavatar_core::job::JobStatusResponse;
use syncavatar_core::types::JobId;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Receives status responses from the poll loop.
#[async_trait]
pub trait StatusSink: Send + Sync + 'static {
    /// Apply one response for `job_id`.
    ///
    /// Implementations must re-check `cancel` (and that `job_id` is still
    /// current) under their own lock before mutating anything. Returning
    /// [`ControlFlow::Break`] ends the loop.
    async fn apply(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        response: &JobStatusResponse,
    ) -> ControlFlow<()>;
}

/// Keeps a poll task alive. Dropping it cancels the task.
#[derive(Debug)]
pub struct PollerGuard {
    job_id: JobId,
    _cancel: DropGuard,
}

impl PollerGuard {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

/// Spawn the poll task for `job_id`.
///
/// The token is a child of `parent`, so cancelling the parent stops every
/// poller spawned from it.
///
/// `period` must be non-zero.
pub fn spawn<S: StatusSink>(
    sink: Arc<S>,
    backend: Arc<dyn JobBackend>,
    job_id: JobId,
    period: Duration,
    parent: &CancellationToken,
) -> PollerGuard {
    let cancel = parent.child_token();
    tokio::spawn(run(sink, backend, job_id.clone(), period, cancel.clone()));
    PollerGuard {
        job_id,
        _cancel: cancel.drop_guard(),
    }
}

async fn run<S: StatusSink>(
    sink: Arc<S>,
    backend: Arc<dyn JobBackend>,
    job_id: JobId,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(job_id = %job_id, period_ms = period.as_millis() as u64, "Polling started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = backend.fetch_status(&job_id) => result,
        };

        match result {
            Ok(response) => {
                if sink.apply(&job_id, &cancel, &response).await.is_break() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Status poll failed, retrying next tick");
            }
        }
    }

    tracing::debug!(job_id = %job_id, "Polling stopped");
}
