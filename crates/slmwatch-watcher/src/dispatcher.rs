//! Exit order dispatch.

use slmwatch_broker::DynBrokerClient;
use slmwatch_core::{ExitOrderRequest, PlacedOrder};
use slmwatch_telemetry::Metrics;
use tracing::{error, info};

use crate::error::{WatchError, WatchResult};

/// Submits compensation orders. One attempt per call; a failure is
/// returned to the caller and never retried here.
pub struct ExitDispatcher {
    broker: DynBrokerClient,
}

impl ExitDispatcher {
    #[must_use]
    pub fn new(broker: DynBrokerClient) -> Self {
        Self { broker }
    }

    pub async fn dispatch(&self, request: &ExitOrderRequest) -> WatchResult<PlacedOrder> {
        info!(
            symbol = %request.trading_symbol,
            exchange = %request.exchange,
            product = %request.product,
            quantity = request.quantity,
            side = %request.transaction_type,
            tag = %request.tag,
            "Placing exit order"
        );

        match self.broker.place_market_order(request).await {
            Ok(placed) => {
                Metrics::exit_order(true);
                info!(order_id = %placed.order_id, "Exit order placed");
                Ok(placed)
            }
            Err(e) => {
                Metrics::exit_order(false);
                error!(
                    symbol = %request.trading_symbol,
                    quantity = request.quantity,
                    error = %e,
                    "Exit order placement failed, position may remain open"
                );
                Err(WatchError::Dispatch(e))
            }
        }
    }
}
