//! Re-enrolls compensation orders with the watcher.
//!
//! Best-effort: the exit order is already live when this runs, so a failed
//! enqueue is logged and reported but never undoes or repeats the placement.

use slmwatch_core::{PlacedOrder, WatcherJobInput};
use slmwatch_queue::{DynJobQueue, JobId, SuccessorPayload};
use slmwatch_telemetry::Metrics;
use tracing::{error, info};

/// Result of re-enrolling a compensation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequeueStatus {
    Enqueued(JobId),
    /// The new order is not being watched.
    Failed(String),
}

impl RequeueStatus {
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued(_))
    }
}

pub struct RequeueController {
    queue: DynJobQueue,
}

impl RequeueController {
    #[must_use]
    pub fn new(queue: DynJobQueue) -> Self {
        Self { queue }
    }

    /// Enqueue one successor watch job for `placed`, carrying the job data
    /// of `input` unchanged. Exactly one enqueue attempt.
    pub async fn requeue(&self, input: &WatcherJobInput, placed: &PlacedOrder) -> RequeueStatus {
        let successor = SuccessorPayload::watch(placed);

        match self
            .queue
            .enqueue(input.initial_job_data.clone(), successor)
            .await
        {
            Ok(job_id) => {
                Metrics::requeue(true);
                info!(
                    job_id = %job_id,
                    order_id = %placed.order_id,
                    parent_order_id = %input.watched_order_id,
                    "Exit order enrolled for watching"
                );
                RequeueStatus::Enqueued(job_id)
            }
            Err(e) => {
                Metrics::requeue(false);
                error!(
                    order_id = %placed.order_id,
                    parent_order_id = %input.watched_order_id,
                    error = %e,
                    "Failed to enroll exit order for watching, order is unmonitored"
                );
                RequeueStatus::Failed(e.to_string())
            }
        }
    }
}
