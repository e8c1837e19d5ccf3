//! Watcher error types.
//!
//! These never reach the scheduler: `SlmWatcher::watch` resolves every
//! error into a `Done` outcome.

use slmwatch_broker::BrokerError;
use slmwatch_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to fetch order history: {0}")]
    OrderHistory(#[source] BrokerError),

    #[error("Failed to fetch open positions: {0}")]
    Positions(#[source] BrokerError),

    #[error("Invalid exit order: {0}")]
    InvalidExitOrder(#[from] CoreError),

    #[error("Exit order placement failed: {0}")]
    Dispatch(#[source] BrokerError),
}

pub type WatchResult<T> = Result<T, WatchError>;
