//! Compensation planning.
//!
//! Decides whether a qualifying cancellation needs a market exit order.
//! The watched order was itself an exit, so the compensation keeps its
//! direction and instrument and only switches to a market order for the
//! quantity the exchange cancelled.

use slmwatch_core::{ExitOrderRequest, PositionSnapshot};

use crate::classifier::Cancellation;
use crate::error::WatchResult;

/// What to do about a qualifying cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationPlan {
    /// No open position covers the cancelled quantity (already closed elsewhere).
    NoOpenPosition,
    /// Place this market exit.
    Exit(ExitOrderRequest),
}

/// Plan the compensation for `cancellation` against a fresh position snapshot.
///
/// A position qualifies when symbol, exchange and product match and its
/// absolute quantity is at least the cancelled quantity. A zero cancelled
/// quantity is handled by the caller before positions are fetched; if one
/// reaches the planner anyway, building the exit fails with
/// `InvalidExitOrder`.
pub fn plan_compensation(
    cancellation: &Cancellation<'_>,
    order_tag: &str,
    positions: &PositionSnapshot,
) -> WatchResult<CompensationPlan> {
    let quantity = cancellation.cancelled_quantity();
    let event = cancellation.event;
    let covering = positions.find_covering(
        &event.trading_symbol,
        &event.exchange,
        &event.product,
        quantity,
    );
    if covering.is_none() {
        return Ok(CompensationPlan::NoOpenPosition);
    }

    let request = ExitOrderRequest::market(event, quantity, order_tag)?;
    Ok(CompensationPlan::Exit(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CancellationCause;
    use crate::error::WatchError;
    use slmwatch_core::{OrderEvent, OrderId, OrderStatus, OrderType, PositionRow, TransactionType};

    fn cancelled(quantity: u64, side: TransactionType) -> OrderEvent {
        OrderEvent {
            order_id: OrderId::from("SLM-1"),
            status: OrderStatus::new("CANCELLED"),
            cancelled_quantity: quantity,
            status_message_raw: None,
            transaction_type: side,
            trading_symbol: "X".to_string(),
            exchange: "E".to_string(),
            product: "P".to_string(),
        }
    }

    fn positions(quantity: i64) -> PositionSnapshot {
        PositionSnapshot::new(vec![PositionRow {
            trading_symbol: "X".to_string(),
            exchange: "E".to_string(),
            product: "P".to_string(),
            quantity,
        }])
    }

    fn cancellation(event: &OrderEvent) -> Cancellation<'_> {
        Cancellation {
            event,
            cause: CancellationCause::OutOfRange,
        }
    }

    #[test]
    fn test_full_position_produces_market_exit() {
        let event = cancelled(50, TransactionType::Sell);
        let plan = plan_compensation(&cancellation(&event), "tag-1", &positions(50)).unwrap();

        let CompensationPlan::Exit(request) = plan else {
            panic!("expected exit plan, got {plan:?}");
        };
        assert_eq!(request.trading_symbol, "X");
        assert_eq!(request.exchange, "E");
        assert_eq!(request.product, "P");
        assert_eq!(request.quantity, 50);
        assert_eq!(request.order_type, OrderType::Market);
        assert_eq!(request.transaction_type, TransactionType::Sell);
        assert_eq!(request.tag, "tag-1");
    }

    #[test]
    fn test_smaller_position_means_no_action() {
        let event = cancelled(50, TransactionType::Sell);
        let plan = plan_compensation(&cancellation(&event), "tag-1", &positions(30)).unwrap();
        assert_eq!(plan, CompensationPlan::NoOpenPosition);
    }

    #[test]
    fn test_short_position_counts_by_absolute_quantity() {
        let event = cancelled(20, TransactionType::Buy);
        let plan = plan_compensation(&cancellation(&event), "tag-1", &positions(-40)).unwrap();
        match plan {
            CompensationPlan::Exit(request) => {
                assert_eq!(request.quantity, 20);
                assert_eq!(request.transaction_type, TransactionType::Buy);
            }
            other => panic!("expected exit plan, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_cancelled_quantity_never_builds_an_exit() {
        let event = cancelled(0, TransactionType::Sell);
        let result = plan_compensation(&cancellation(&event), "tag-1", &positions(50));
        assert!(matches!(result, Err(WatchError::InvalidExitOrder(_))));
    }

    #[test]
    fn test_empty_snapshot_means_no_action() {
        let event = cancelled(10, TransactionType::Sell);
        let plan =
            plan_compensation(&cancellation(&event), "tag-1", &PositionSnapshot::default())
                .unwrap();
        assert_eq!(plan, CompensationPlan::NoOpenPosition);
    }
}
