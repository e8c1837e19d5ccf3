//! Queue job types and the queue trait.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slmwatch_core::{
    AccountContext, BoxFuture, InitialJobData, OrderId, PlacedOrder, WatcherJobInput,
};
use uuid::Uuid;

use crate::error::QueueResult;

/// Name of the queue that feeds the stop-loss-market watcher.
pub const WATCHER_QUEUE_NAME: &str = "slm-watcher";

/// Queue-assigned job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the order a successor job should process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessorPayload {
    /// Queue the job is addressed to.
    pub next_queue: String,
    pub order_id: OrderId,
    /// Broker confirmation of the order placement.
    pub raw_confirmation: serde_json::Value,
}

impl SuccessorPayload {
    /// Payload that enrolls a freshly placed order with the watcher.
    pub fn watch(placed: &PlacedOrder) -> Self {
        Self {
            next_queue: WATCHER_QUEUE_NAME.to_string(),
            order_id: placed.order_id.clone(),
            raw_confirmation: placed.raw_confirmation.clone(),
        }
    }
}

/// A job as delivered to the queue consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub initial_job_data: InitialJobData,
    pub successor: SuccessorPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedJob {
    /// Watch input for the successor order.
    pub fn into_watch_input(self, account: AccountContext) -> WatcherJobInput {
        WatcherJobInput::new(self.successor.order_id, account, self.initial_job_data)
    }
}

/// Queue that accepts successor jobs.
pub trait JobQueue: Send + Sync {
    /// Enqueue a successor job carrying `initial_job_data` unchanged.
    fn enqueue(
        &self,
        initial_job_data: InitialJobData,
        successor: SuccessorPayload,
    ) -> BoxFuture<'_, QueueResult<JobId>>;
}

/// Arc wrapper for JobQueue trait objects.
pub type DynJobQueue = Arc<dyn JobQueue>;
