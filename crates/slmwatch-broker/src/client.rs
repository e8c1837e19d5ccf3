//! Broker client trait.
//!
//! Provides a trait-based abstraction over the exchange account. This allows for:
//! - Dependency injection of the live or mock broker
//! - Unit testing the watcher without network access

use std::sync::Arc;

pub use slmwatch_core::BoxFuture;
use slmwatch_core::{
    BrokerConstants, ExitOrderRequest, OrderEvent, OrderId, PlacedOrder, PositionSnapshot,
};

use crate::error::BrokerResult;

/// Exchange account operations used by the watcher.
///
/// Every call is independent and safe to issue concurrently from
/// different watch jobs. Implementations must not cache positions.
pub trait BrokerClient: Send + Sync {
    /// Status and rejection strings this broker reports.
    fn constants(&self) -> &BrokerConstants;

    /// Order history for one order id, oldest first.
    fn fetch_order_history<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> BoxFuture<'a, BrokerResult<Vec<OrderEvent>>>;

    /// Current open net positions.
    fn fetch_open_positions(&self) -> BoxFuture<'_, BrokerResult<PositionSnapshot>>;

    /// Place a regular market order. Single attempt, no retry.
    fn place_market_order<'a>(
        &'a self,
        request: &'a ExitOrderRequest,
    ) -> BoxFuture<'a, BrokerResult<PlacedOrder>>;
}

/// Arc wrapper for BrokerClient trait objects.
pub type DynBrokerClient = Arc<dyn BrokerClient>;
