//! Core domain types for the stop-loss-market order watcher.
//!
//! This crate provides the types shared by the broker, queue and watcher crates:
//! - `OrderEvent`, `OrderStatus`: Exchange-reported order history snapshots
//! - `BrokerConstants`: Broker-defined status and rejection strings
//! - `PositionSnapshot`: Open net positions for the account
//! - `ExitOrderRequest`, `PlacedOrder`: Compensation order request and confirmation
//! - `WatcherJobInput`: One watched order plus the job data carried along its chain

pub mod error;
pub mod job;
pub mod order;
pub mod position;

pub use error::{CoreError, Result};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub use job::{AccountContext, InitialJobData, WatcherJobInput};
pub use order::{
    BrokerConstants, ExitOrderRequest, OrderEvent, OrderId, OrderStatus, OrderType, PlacedOrder,
    TransactionType,
};
pub use position::{PositionRow, PositionSnapshot};
