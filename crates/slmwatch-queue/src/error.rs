//! Queue error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is full (capacity {0})")]
    Full(usize),

    #[error("Queue is closed")]
    Closed,

    #[error("Unknown queue: {0}")]
    UnknownQueue(String),
}

pub type QueueResult<T> = Result<T, QueueError>;
