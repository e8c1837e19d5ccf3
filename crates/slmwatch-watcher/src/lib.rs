//! Stop-loss-market order watcher.
//!
//! Tracks a conditional exit order with the exchange and, when the exchange
//! cancels it because the price left the permitted execution range, places
//! a market exit for the cancelled quantity and enrolls that new order for
//! the same watching.
//!
//! # Key Components
//!
//! - [`classify`]: Pure classification of an order history
//! - [`plan_compensation`]: Decides whether and how to build the exit order
//! - [`ExitDispatcher`]: Places the exit order (single attempt)
//! - [`RequeueController`]: Best-effort re-enrollment of the exit order
//! - [`SlmWatcher`]: Per-invocation orchestration returning a [`WatchOutcome`]

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod planner;
pub mod requeue;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use classifier::{classify, Cancellation, CancellationCause, Classification};
pub use config::WatcherConfig;
pub use dispatcher::ExitDispatcher;
pub use error::{WatchError, WatchResult};
pub use outcome::{FailureStage, Termination, WatchAction, WatchOutcome};
pub use planner::{plan_compensation, CompensationPlan};
pub use requeue::{RequeueController, RequeueStatus};
pub use watcher::SlmWatcher;
