//! Deterministic fake broker.
//!
//! Used when mock orders are enabled in configuration and as the broker
//! double in tests. Histories and positions are scripted up front; nothing
//! is sampled at random.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::json;
use slmwatch_core::{
    BrokerConstants, ExitOrderRequest, OrderEvent, OrderId, OrderStatus, PlacedOrder,
    PositionRow, PositionSnapshot, TransactionType,
};
use tracing::debug;

use crate::client::{BoxFuture, BrokerClient};
use crate::error::{BrokerError, BrokerResult};

/// Scripted in-memory broker.
#[derive(Debug)]
pub struct FakeBroker {
    constants: BrokerConstants,
    histories: Mutex<HashMap<OrderId, Vec<OrderEvent>>>,
    positions: Mutex<Vec<PositionRow>>,
    /// Recorded placements for verification.
    placed: Mutex<Vec<ExitOrderRequest>>,
    /// Counters for verification.
    history_calls: AtomicU64,
    position_calls: AtomicU64,
    next_order_seq: AtomicU64,
    fail_history: AtomicBool,
    fail_positions: AtomicBool,
    fail_placement: AtomicBool,
    /// Record a completed history for every placed order.
    complete_placed_orders: AtomicBool,
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBroker {
    /// Create an empty fake broker with default constants.
    pub fn new() -> Self {
        Self::with_constants(BrokerConstants::default())
    }

    pub fn with_constants(constants: BrokerConstants) -> Self {
        Self {
            constants,
            histories: Mutex::new(HashMap::new()),
            positions: Mutex::new(Vec::new()),
            placed: Mutex::new(Vec::new()),
            history_calls: AtomicU64::new(0),
            position_calls: AtomicU64::new(0),
            next_order_seq: AtomicU64::new(1),
            fail_history: AtomicBool::new(false),
            fail_positions: AtomicBool::new(false),
            fail_placement: AtomicBool::new(false),
            complete_placed_orders: AtomicBool::new(false),
        }
    }

    /// Broker loaded with an exchange out-of-range cancellation.
    ///
    /// Order `SLM-1` (SELL 20 ABC/NSE/MIS) goes from trigger pending to
    /// cancelled with the execution range rejection, while the account is
    /// short 40 ABC. Placed orders complete immediately, so a mock watch
    /// chain terminates after one compensation.
    pub fn out_of_range_fixture() -> Self {
        let broker = Self::new();
        let order_id = OrderId::from("SLM-1");
        let pending = broker.event(&order_id, "TRIGGER PENDING", 0, None);
        let cancelled = OrderEvent {
            status_message_raw: Some(broker.constants.out_of_range_message.clone()),
            ..broker.event(&order_id, &broker.constants.status_cancelled, 20, None)
        };
        broker.set_history(order_id, vec![pending, cancelled]);
        broker.set_positions(vec![PositionRow {
            trading_symbol: "ABC".to_string(),
            exchange: "NSE".to_string(),
            product: "MIS".to_string(),
            quantity: -40,
        }]);
        broker.set_complete_placed_orders(true);
        broker
    }

    /// Build a SELL ABC/NSE/MIS event for `order_id`.
    pub fn event(
        &self,
        order_id: &OrderId,
        status: &str,
        cancelled_quantity: u64,
        status_message_raw: Option<&str>,
    ) -> OrderEvent {
        OrderEvent {
            order_id: order_id.clone(),
            status: OrderStatus::new(status),
            cancelled_quantity,
            status_message_raw: status_message_raw.map(str::to_string),
            transaction_type: TransactionType::Sell,
            trading_symbol: "ABC".to_string(),
            exchange: "NSE".to_string(),
            product: "MIS".to_string(),
        }
    }

    /// Replace the history for an order (oldest first).
    pub fn set_history(&self, order_id: OrderId, events: Vec<OrderEvent>) {
        self.histories.lock().insert(order_id, events);
    }

    /// Append one event to an order's history.
    pub fn push_event(&self, event: OrderEvent) {
        self.histories
            .lock()
            .entry(event.order_id.clone())
            .or_default()
            .push(event);
    }

    pub fn set_positions(&self, rows: Vec<PositionRow>) {
        *self.positions.lock() = rows;
    }

    pub fn set_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_positions(&self, fail: bool) {
        self.fail_positions.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_placement(&self, fail: bool) {
        self.fail_placement.store(fail, Ordering::SeqCst);
    }

    pub fn set_complete_placed_orders(&self, complete: bool) {
        self.complete_placed_orders.store(complete, Ordering::SeqCst);
    }

    /// Get recorded placements.
    pub fn placed_orders(&self) -> Vec<ExitOrderRequest> {
        self.placed.lock().clone()
    }

    pub fn history_calls(&self) -> u64 {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn position_calls(&self) -> u64 {
        self.position_calls.load(Ordering::SeqCst)
    }

    fn completed_event(&self, order_id: &OrderId, request: &ExitOrderRequest) -> OrderEvent {
        OrderEvent {
            order_id: order_id.clone(),
            status: OrderStatus::new(self.constants.status_completed.clone()),
            cancelled_quantity: 0,
            status_message_raw: None,
            transaction_type: request.transaction_type,
            trading_symbol: request.trading_symbol.clone(),
            exchange: request.exchange.clone(),
            product: request.product.clone(),
        }
    }
}

impl BrokerClient for FakeBroker {
    fn constants(&self) -> &BrokerConstants {
        &self.constants
    }

    fn fetch_order_history<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> BoxFuture<'a, BrokerResult<Vec<OrderEvent>>> {
        Box::pin(async move {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_history.load(Ordering::SeqCst) {
                return Err(BrokerError::Simulated("order history unavailable".to_string()));
            }
            Ok(self
                .histories
                .lock()
                .get(order_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn fetch_open_positions(&self) -> BoxFuture<'_, BrokerResult<PositionSnapshot>> {
        Box::pin(async move {
            self.position_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_positions.load(Ordering::SeqCst) {
                return Err(BrokerError::Simulated("positions unavailable".to_string()));
            }
            Ok(PositionSnapshot::new(self.positions.lock().clone()))
        })
    }

    fn place_market_order<'a>(
        &'a self,
        request: &'a ExitOrderRequest,
    ) -> BoxFuture<'a, BrokerResult<PlacedOrder>> {
        Box::pin(async move {
            self.placed.lock().push(request.clone());
            if self.fail_placement.load(Ordering::SeqCst) {
                return Err(BrokerError::Simulated("order placement rejected".to_string()));
            }

            let seq = self.next_order_seq.fetch_add(1, Ordering::SeqCst);
            let order_id = OrderId::from(format!("FAKE-{seq}"));
            if self.complete_placed_orders.load(Ordering::SeqCst) {
                let event = self.completed_event(&order_id, request);
                self.push_event(event);
            }
            debug!(order_id = %order_id, quantity = request.quantity, "Fake order placed");

            Ok(PlacedOrder {
                raw_confirmation: json!({
                    "status": "success",
                    "data": { "order_id": order_id.as_str() }
                }),
                order_id,
            })
        })
    }
}
