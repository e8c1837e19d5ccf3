//! In-process job queue backed by a bounded tokio channel.

use chrono::Utc;
use slmwatch_core::{BoxFuture, InitialJobData};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::{JobId, JobQueue, QueuedJob, SuccessorPayload, WATCHER_QUEUE_NAME};

/// Watcher queue delivering jobs to a single consumer.
///
/// Enqueue never blocks: a full or closed channel is reported as an error
/// so the caller can decide what to do with it.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    tx: mpsc::Sender<QueuedJob>,
    capacity: usize,
}

impl ChannelQueue {
    /// Create a queue and the receiver its consumer drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueuedJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, capacity }, rx)
    }

    fn push(
        &self,
        initial_job_data: InitialJobData,
        successor: SuccessorPayload,
    ) -> QueueResult<JobId> {
        if successor.next_queue != WATCHER_QUEUE_NAME {
            return Err(QueueError::UnknownQueue(successor.next_queue));
        }

        let job = QueuedJob {
            id: JobId::new(),
            initial_job_data,
            successor,
            enqueued_at: Utc::now(),
        };
        let id = job.id;
        let order_id = job.successor.order_id.clone();

        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(job_id = %id, order_id = %order_id, "Job enqueued");
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(order_id = %order_id, capacity = self.capacity, "Watcher queue full");
                Err(QueueError::Full(self.capacity))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }
}

impl JobQueue for ChannelQueue {
    fn enqueue(
        &self,
        initial_job_data: InitialJobData,
        successor: SuccessorPayload,
    ) -> BoxFuture<'_, QueueResult<JobId>> {
        let result = self.push(initial_job_data, successor);
        Box::pin(async move { result })
    }
}
