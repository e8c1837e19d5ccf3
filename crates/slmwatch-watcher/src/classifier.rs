//! Order history classification.
//!
//! Turns the exchange-reported history of one order into a single
//! classification. Pure and total: the same history always yields the same
//! class, and every history (including an empty one) yields exactly one.
//!
//! # Rules
//!
//! History is searched newest to oldest:
//! 1. Any completed event → `Completed`
//! 2. Otherwise the most recent cancellation event decides between
//!    `CancelledQualifying` and `CancelledNonQualifying`
//! 3. Otherwise → `Pending`

use slmwatch_core::{BrokerConstants, OrderEvent};

/// Why an order was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationCause {
    /// Exchange cancelled because the price left the permitted execution range.
    OutOfRange,
    /// Anything else (user, another process, unknown).
    Other,
}

impl CancellationCause {
    pub fn of(event: &OrderEvent, constants: &BrokerConstants) -> Self {
        match event.status_message_raw.as_deref() {
            Some(message) if message == constants.out_of_range_message => Self::OutOfRange,
            _ => Self::Other,
        }
    }

    /// Whether this cancellation should be compensated.
    ///
    /// `watch_manual_cancellations` makes every cause qualify.
    pub fn is_qualifying(&self, watch_manual_cancellations: bool) -> bool {
        watch_manual_cancellations || *self == Self::OutOfRange
    }
}

/// The cancellation event selected from a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation<'a> {
    pub event: &'a OrderEvent,
    pub cause: CancellationCause,
}

impl Cancellation<'_> {
    pub fn cancelled_quantity(&self) -> u64 {
        self.event.cancelled_quantity
    }

    pub fn status_message(&self) -> Option<&str> {
        self.event.status_message_raw.as_deref()
    }
}

/// Classification of an order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// The order executed. Nothing left to watch.
    Completed,
    /// Cancelled by the exchange (or override enabled); eligible for compensation.
    CancelledQualifying(Cancellation<'a>),
    /// Cancelled deliberately; the position is left as-is.
    CancelledNonQualifying(Cancellation<'a>),
    /// Neither completed nor cancelled yet. Check again later.
    Pending,
}

impl Classification<'_> {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CancelledQualifying(_) => "cancelled_qualifying",
            Self::CancelledNonQualifying(_) => "cancelled_non_qualifying",
            Self::Pending => "pending",
        }
    }
}

/// Classify an order history given oldest first.
pub fn classify<'a>(
    history: &'a [OrderEvent],
    constants: &BrokerConstants,
    watch_manual_cancellations: bool,
) -> Classification<'a> {
    if history
        .iter()
        .rev()
        .any(|event| event.status.is_completed(constants))
    {
        return Classification::Completed;
    }

    let Some(event) = history
        .iter()
        .rev()
        .find(|event| event.status.is_cancelled(constants))
    else {
        return Classification::Pending;
    };

    let cancellation = Cancellation {
        event,
        cause: CancellationCause::of(event, constants),
    };

    if cancellation.cause.is_qualifying(watch_manual_cancellations) {
        Classification::CancelledQualifying(cancellation)
    } else {
        Classification::CancelledNonQualifying(cancellation)
    }
}
