//! Broker access for the stop-loss-market watcher.
//!
//! The watcher only talks to the exchange through the [`BrokerClient`] trait,
//! so the live/mock choice is made by injecting an implementation:
//! - [`KiteClient`]: Kite Connect REST client
//! - [`FakeBroker`]: Deterministic scripted broker for mock mode and tests

pub mod client;
pub mod error;
pub mod fake;
pub mod kite;

pub use client::{BoxFuture, BrokerClient, DynBrokerClient};
pub use error::{BrokerError, BrokerResult};
pub use fake::FakeBroker;
pub use kite::{KiteClient, KiteConfig};
