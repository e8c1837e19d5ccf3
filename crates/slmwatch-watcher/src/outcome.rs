//! Watch outcome handed back to the scheduler.
//!
//! The scheduler only distinguishes `Retry` (invoke again next tick) from
//! `Done` (stop scheduling this order). `Termination` records why a watch
//! ended, including the failures that were resolved as `Done` on purpose,
//! so operators can tell them apart from normal completion.

use std::fmt;

use slmwatch_core::OrderId;

use crate::error::WatchError;
use crate::requeue::RequeueStatus;

/// Where a swallowed failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    OrderHistory,
    Positions,
    Planning,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderHistory => "order_history",
            Self::Positions => "positions",
            Self::Planning => "planning",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The watched order completed.
    OrderCompleted,
    /// Cancelled for a non-qualifying reason; position left open on purpose.
    CancelledByUser,
    /// Qualifying cancellation with nothing cancelled.
    NothingCancelled,
    /// Qualifying cancellation but no open position covers the quantity.
    NoOpenPosition,
    /// Exit order placed.
    Compensated {
        order_id: OrderId,
        requeue: RequeueStatus,
    },
    /// Exit order placement failed. Exposure may remain.
    DispatchFailed { reason: String },
    /// Unexpected failure resolved as Done to rule out duplicate compensation.
    Aborted { stage: FailureStage, reason: String },
}

/// Action taken by a finished watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    None,
    Compensated(OrderId),
}

impl Termination {
    pub fn action(&self) -> WatchAction {
        match self {
            Self::Compensated { order_id, .. } => WatchAction::Compensated(order_id.clone()),
            _ => WatchAction::None,
        }
    }

    /// Failure channel: the watch ended without doing its job.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::DispatchFailed { .. } | Self::Aborted { .. })
    }

    /// Failures plus compensations whose new order is not being watched.
    pub fn needs_attention(&self) -> bool {
        match self {
            Self::Compensated { requeue, .. } => !requeue.is_enqueued(),
            other => other.is_failure(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OrderCompleted => "completed",
            Self::CancelledByUser => "cancelled_by_user",
            Self::NothingCancelled => "nothing_cancelled",
            Self::NoOpenPosition => "no_open_position",
            Self::Compensated { .. } => "compensated",
            Self::DispatchFailed { .. } => "dispatch_failed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

impl From<WatchError> for Termination {
    fn from(error: WatchError) -> Self {
        let reason = error.to_string();
        match error {
            WatchError::OrderHistory(_) => Self::Aborted {
                stage: FailureStage::OrderHistory,
                reason,
            },
            WatchError::Positions(_) => Self::Aborted {
                stage: FailureStage::Positions,
                reason,
            },
            WatchError::InvalidExitOrder(_) => Self::Aborted {
                stage: FailureStage::Planning,
                reason,
            },
            WatchError::Dispatch(_) => Self::DispatchFailed { reason },
        }
    }
}

/// Signal for the scheduler. Exactly one per watch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Order still open; invoke again on the next tick.
    Retry,
    /// Stop watching this order.
    Done(Termination),
}

impl WatchOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn action(&self) -> WatchAction {
        match self {
            Self::Retry => WatchAction::None,
            Self::Done(termination) => termination.action(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Done(termination) => termination.label(),
        }
    }
}
