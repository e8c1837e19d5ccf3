//! Scheduler host for the stop-loss-market order watcher.
//!
//! Wires the components together and drives them:
//! - Broker selection (Kite REST or deterministic fake)
//! - Fixed-interval scheduling of every watched order until `Done`
//! - Consumption of successor jobs from the watcher queue

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunSummary, WatchReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
