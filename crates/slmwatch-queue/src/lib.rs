//! Job queue for the stop-loss-market watcher.
//!
//! Compensation orders are re-enrolled for watching by enqueueing a
//! successor job that carries the original job data forward.
//!
//! # Key Components
//!
//! - [`JobQueue`]: Trait the watcher enqueues successor jobs through
//! - [`SuccessorPayload`]: Identity of the new order to watch
//! - [`QueuedJob`]: A job as delivered to the consumer
//! - [`ChannelQueue`]: In-process queue backed by a bounded tokio channel

pub mod channel;
pub mod error;
pub mod job;

pub use channel::ChannelQueue;
pub use error::{QueueError, QueueResult};
pub use job::{DynJobQueue, JobId, JobQueue, QueuedJob, SuccessorPayload, WATCHER_QUEUE_NAME};
