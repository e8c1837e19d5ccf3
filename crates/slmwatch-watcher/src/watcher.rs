//! Stop-loss-market order watcher.
//!
//! Invoked by an external scheduler once per tick for each watched order.
//! Each invocation reads the order history and positions fresh, decides,
//! and returns exactly one [`WatchOutcome`].
//!
//! # Flow
//!
//! ```text
//! fetch history → classify
//!   Pending                 → Retry
//!   Completed               → Done
//!   CancelledNonQualifying  → Done (position left open)
//!   CancelledQualifying     → nothing cancelled? → Done
//!       fetch positions → plan
//!       NoOpenPosition      → Done
//!       Exit(request)       → dispatch → requeue (best-effort) → Done
//! ```
//!
//! # Failure policy
//!
//! No error ever reaches the scheduler. Anything that goes wrong resolves as
//! `Done` with a failure `Termination`: a scheduler-level retry could place
//! a second compensation order for the same cancellation, which is worse
//! than leaving one order unmonitored.

use slmwatch_broker::DynBrokerClient;
use slmwatch_core::WatcherJobInput;
use slmwatch_queue::DynJobQueue;
use slmwatch_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::classifier::{classify, Cancellation, Classification};
use crate::config::WatcherConfig;
use crate::dispatcher::ExitDispatcher;
use crate::error::{WatchError, WatchResult};
use crate::outcome::{Termination, WatchOutcome};
use crate::planner::{plan_compensation, CompensationPlan};
use crate::requeue::RequeueController;

/// Watcher for stop-loss-market exit orders.
///
/// Holds no per-order state; one instance serves any number of concurrent
/// watch jobs.
pub struct SlmWatcher {
    broker: DynBrokerClient,
    dispatcher: ExitDispatcher,
    requeue: RequeueController,
    config: WatcherConfig,
}

impl SlmWatcher {
    /// Create a new SlmWatcher.
    #[must_use]
    pub fn new(broker: DynBrokerClient, queue: DynJobQueue, config: WatcherConfig) -> Self {
        if config.watch_manual_cancellations {
            warn!(
                "watch_manual_cancellations is ENABLED: every cancelled order will be \
                 squared off at market, including manual cancellations. Test accounts only!"
            );
        }

        Self {
            dispatcher: ExitDispatcher::new(broker.clone()),
            requeue: RequeueController::new(queue),
            broker,
            config,
        }
    }

    /// Run one watch invocation for `input`.
    pub async fn watch(&self, input: &WatcherJobInput) -> WatchOutcome {
        let outcome = match self.evaluate(input).await {
            Ok(outcome) => outcome,
            Err(e) => self.resolve_failure(input, e),
        };
        Metrics::watch_outcome(outcome.label());
        outcome
    }

    fn resolve_failure(&self, input: &WatcherJobInput, e: WatchError) -> WatchOutcome {
        let termination = Termination::from(e);
        let stage = match &termination {
            Termination::Aborted { stage, .. } => stage.as_str(),
            _ => "dispatch",
        };
        Metrics::swallowed_error(stage);
        error!(
            order_id = %input.watched_order_id,
            user = %input.account.user_id,
            stage,
            termination = ?termination,
            "Watcher error, watch terminated without retry"
        );
        WatchOutcome::Done(termination)
    }

    async fn evaluate(&self, input: &WatcherJobInput) -> WatchResult<WatchOutcome> {
        let order_id = &input.watched_order_id;
        let history = self
            .broker
            .fetch_order_history(order_id)
            .await
            .map_err(WatchError::OrderHistory)?;

        let classification = classify(
            &history,
            self.broker.constants(),
            self.config.watch_manual_cancellations,
        );

        match classification {
            Classification::Pending => {
                debug!(
                    order_id = %order_id,
                    events = history.len(),
                    "Order neither completed nor cancelled, watching"
                );
                Ok(WatchOutcome::Retry)
            }
            Classification::Completed => {
                info!(order_id = %order_id, "Order completed");
                Ok(WatchOutcome::Done(Termination::OrderCompleted))
            }
            Classification::CancelledNonQualifying(cancellation) => {
                info!(
                    order_id = %order_id,
                    status_message = cancellation.status_message().unwrap_or_default(),
                    "Order cancelled by user, leaving position as-is"
                );
                Ok(WatchOutcome::Done(Termination::CancelledByUser))
            }
            Classification::CancelledQualifying(cancellation) => {
                let termination = self.compensate(input, &cancellation).await?;
                Ok(WatchOutcome::Done(termination))
            }
        }
    }

    async fn compensate(
        &self,
        input: &WatcherJobInput,
        cancellation: &Cancellation<'_>,
    ) -> WatchResult<Termination> {
        let order_id = &input.watched_order_id;
        info!(
            order_id = %order_id,
            cancelled_qty = cancellation.cancelled_quantity(),
            status_message = cancellation.status_message().unwrap_or_default(),
            cause = ?cancellation.cause,
            "Found cancelled SLM order"
        );

        // Zero quantity needs no exit, so positions are not fetched.
        if cancellation.cancelled_quantity() == 0 {
            info!(order_id = %order_id, "Nothing cancelled, no exit needed");
            return Ok(Termination::NothingCancelled);
        }

        let positions = self
            .broker
            .fetch_open_positions()
            .await
            .map_err(WatchError::Positions)?;

        let request = match plan_compensation(cancellation, input.order_tag(), &positions)? {
            CompensationPlan::Exit(request) => request,
            CompensationPlan::NoOpenPosition => {
                warn!(
                    order_id = %order_id,
                    symbol = %cancellation.event.trading_symbol,
                    cancelled_qty = cancellation.cancelled_quantity(),
                    "No open position to square off"
                );
                return Ok(Termination::NoOpenPosition);
            }
        };

        let placed = self.dispatcher.dispatch(&request).await?;
        let requeue = self.requeue.requeue(input, &placed).await;

        Ok(Termination::Compensated {
            order_id: placed.order_id,
            requeue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{FailureStage, WatchAction};
    use crate::requeue::RequeueStatus;
    use crate::testing::MockQueue;
    use slmwatch_broker::FakeBroker;
    use slmwatch_core::{
        AccountContext, InitialJobData, OrderId, OrderType, PositionRow, TransactionType,
    };
    use slmwatch_queue::{ChannelQueue, QueueError, QueuedJob};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const OUT_OF_RANGE: &str = "17070 : The Price is out of the current execution range";

    fn input(order_id: &str) -> WatcherJobInput {
        WatcherJobInput::new(
            OrderId::from(order_id),
            AccountContext::new("AB1234"),
            InitialJobData::new("tag-1"),
        )
    }

    fn short_position(quantity: i64) -> PositionRow {
        PositionRow {
            trading_symbol: "ABC".to_string(),
            exchange: "NSE".to_string(),
            product: "MIS".to_string(),
            quantity,
        }
    }

    fn setup(
        broker: Arc<FakeBroker>,
        config: WatcherConfig,
    ) -> (SlmWatcher, mpsc::Receiver<QueuedJob>) {
        let (queue, rx) = ChannelQueue::new(8);
        (SlmWatcher::new(broker, Arc::new(queue), config), rx)
    }

    fn cancelled_broker(quantity: u64, message: Option<&str>, position: i64) -> Arc<FakeBroker> {
        let broker = FakeBroker::new();
        let id = OrderId::from("SLM-1");
        let pending = broker.event(&id, "TRIGGER PENDING", 0, None);
        let cancelled = broker.event(&id, "CANCELLED", quantity, message);
        broker.set_history(id, vec![pending, cancelled]);
        broker.set_positions(vec![short_position(position)]);
        Arc::new(broker)
    }

    #[tokio::test]
    async fn test_pending_order_retries() {
        let broker = Arc::new(FakeBroker::new());
        let id = OrderId::from("SLM-1");
        broker.set_history(id.clone(), vec![broker.event(&id, "TRIGGER PENDING", 0, None)]);
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        assert_eq!(watcher.watch(&input("SLM-1")).await, WatchOutcome::Retry);
        assert_eq!(broker.position_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_order_retries() {
        let broker = Arc::new(FakeBroker::new());
        let (watcher, _rx) = setup(broker, WatcherConfig::default());
        assert_eq!(watcher.watch(&input("SLM-404")).await, WatchOutcome::Retry);
    }

    #[tokio::test]
    async fn test_completed_order_is_done_without_action() {
        let broker = Arc::new(FakeBroker::new());
        let id = OrderId::from("SLM-1");
        broker.set_history(
            id.clone(),
            vec![
                broker.event(&id, "TRIGGER PENDING", 0, None),
                broker.event(&id, "COMPLETE", 0, None),
            ],
        );
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert_eq!(outcome, WatchOutcome::Done(Termination::OrderCompleted));
        assert!(broker.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_user_cancellation_is_left_alone() {
        let broker = cancelled_broker(20, None, -40);
        let (watcher, mut rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert_eq!(outcome, WatchOutcome::Done(Termination::CancelledByUser));
        assert_eq!(broker.position_calls(), 0);
        assert!(broker.placed_orders().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_cancellation_is_compensated() {
        let broker = cancelled_broker(20, Some(OUT_OF_RANGE), -40);
        let (watcher, mut rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert_eq!(
            outcome.action(),
            WatchAction::Compensated(OrderId::from("FAKE-1"))
        );

        let placed = broker.placed_orders();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].quantity, 20);
        assert_eq!(placed[0].transaction_type, TransactionType::Sell);
        assert_eq!(placed[0].order_type, OrderType::Market);
        assert_eq!(placed[0].tag, "tag-1");

        let job = rx.try_recv().unwrap();
        assert_eq!(job.successor.order_id.as_str(), "FAKE-1");
        assert_eq!(job.initial_job_data.order_tag, "tag-1");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_override_compensates_manual_cancellation() {
        let broker = cancelled_broker(20, None, 40);
        let config = WatcherConfig {
            watch_manual_cancellations: true,
        };
        let (watcher, _rx) = setup(broker.clone(), config);

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert!(matches!(
            outcome,
            WatchOutcome::Done(Termination::Compensated { .. })
        ));
        assert_eq!(broker.placed_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_cancelled_quantity_is_done_without_order() {
        let broker = cancelled_broker(0, Some(OUT_OF_RANGE), -40);
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert_eq!(outcome, WatchOutcome::Done(Termination::NothingCancelled));
        assert_eq!(outcome.action(), WatchAction::None);
        assert_eq!(broker.position_calls(), 0);
        assert!(broker.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_position_is_done_without_order() {
        let broker = cancelled_broker(50, Some(OUT_OF_RANGE), 30);
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert_eq!(outcome, WatchOutcome::Done(Termination::NoOpenPosition));
        assert!(broker.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_resolves_as_done() {
        let broker = Arc::new(FakeBroker::new());
        broker.set_fail_history(true);
        let (watcher, _rx) = setup(broker, WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        match outcome {
            WatchOutcome::Done(termination) => {
                assert!(termination.is_failure());
                assert!(matches!(
                    termination,
                    Termination::Aborted {
                        stage: FailureStage::OrderHistory,
                        ..
                    }
                ));
            }
            WatchOutcome::Retry => panic!("errors must not retry"),
        }
    }

    #[tokio::test]
    async fn test_positions_failure_resolves_as_done() {
        let broker = cancelled_broker(20, Some(OUT_OF_RANGE), -40);
        broker.set_fail_positions(true);
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert!(matches!(
            outcome,
            WatchOutcome::Done(Termination::Aborted {
                stage: FailureStage::Positions,
                ..
            })
        ));
        assert!(broker.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_does_not_requeue() {
        let broker = cancelled_broker(20, Some(OUT_OF_RANGE), -40);
        broker.set_fail_placement(true);
        let mut queue = MockQueue::new();
        queue.expect_enqueue_mock().never();
        let watcher = SlmWatcher::new(broker.clone(), Arc::new(queue), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        assert!(matches!(
            outcome,
            WatchOutcome::Done(Termination::DispatchFailed { .. })
        ));
        assert_eq!(broker.placed_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_requeue_failure_keeps_compensation() {
        let broker = cancelled_broker(20, Some(OUT_OF_RANGE), -40);
        let mut queue = MockQueue::new();
        queue
            .expect_enqueue_mock()
            .withf(|data, successor| {
                data.order_tag == "tag-1" && successor.order_id.as_str() == "FAKE-1"
            })
            .times(1)
            .returning(|_, _| Err(QueueError::Closed));
        let watcher = SlmWatcher::new(broker.clone(), Arc::new(queue), WatcherConfig::default());

        let outcome = watcher.watch(&input("SLM-1")).await;
        match outcome {
            WatchOutcome::Done(Termination::Compensated { order_id, requeue }) => {
                assert_eq!(order_id.as_str(), "FAKE-1");
                assert!(matches!(requeue, RequeueStatus::Failed(_)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(broker.placed_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_positions_are_fetched_every_invocation() {
        let broker = cancelled_broker(20, Some(OUT_OF_RANGE), 30);
        let (watcher, _rx) = setup(broker.clone(), WatcherConfig::default());

        watcher.watch(&input("SLM-1")).await;
        watcher.watch(&input("SLM-1")).await;
        assert_eq!(broker.position_calls(), 2);
        assert_eq!(broker.history_calls(), 2);
    }
}
