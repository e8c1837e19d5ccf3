//! Prometheus metrics for the order watcher.
//!
//! Every watch invocation records exactly one outcome. Errors that the
//! watcher swallows to protect against duplicate compensation are counted
//! separately so they can be alerted on.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a startup bug and should crash early.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec, TextEncoder};

use crate::error::{TelemetryError, TelemetryResult};

/// Watch invocations by outcome.
/// Labels: outcome (retry/completed/cancelled_by_user/nothing_cancelled/
/// no_open_position/compensated/dispatch_failed/aborted)
pub static WATCH_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "slmwatch_watch_outcomes_total",
        "Watch invocations by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Compensation exit orders by placement result.
/// Labels: result (placed/failed)
pub static EXIT_ORDERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "slmwatch_exit_orders_total",
        "Compensation exit orders by placement result",
        &["result"]
    )
    .unwrap()
});

/// Successor job enqueue attempts.
/// Labels: result (enqueued/failed)
pub static REQUEUE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "slmwatch_requeue_total",
        "Successor watch job enqueue attempts",
        &["result"]
    )
    .unwrap()
});

/// Errors resolved as Done instead of being surfaced to the scheduler.
/// Labels: stage (order_history/positions/dispatch)
pub static SWALLOWED_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "slmwatch_swallowed_errors_total",
        "Errors resolved as Done to avoid duplicate compensation",
        &["stage"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record the outcome of one watch invocation.
    pub fn watch_outcome(outcome: &str) {
        WATCH_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record an exit order placement attempt.
    pub fn exit_order(placed: bool) {
        let result = if placed { "placed" } else { "failed" };
        EXIT_ORDERS_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record a successor enqueue attempt.
    pub fn requeue(enqueued: bool) {
        let result = if enqueued { "enqueued" } else { "failed" };
        REQUEUE_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record an error that was resolved as Done.
    pub fn swallowed_error(stage: &str) {
        SWALLOWED_ERRORS_TOTAL.with_label_values(&[stage]).inc();
    }

    /// Current value of a watch outcome counter.
    pub fn watch_outcome_count(outcome: &str) -> u64 {
        WATCH_OUTCOMES_TOTAL.with_label_values(&[outcome]).get()
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        TextEncoder::new()
            .encode_to_string(&families)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
