//! Watcher configuration.

use serde::{Deserialize, Serialize};

/// Watcher configuration.
///
/// # Hazard: `watch_manual_cancellations`
///
/// When enabled, EVERY cancellation of a watched order is compensated with
/// a market exit, including cancellations made by a person or by another
/// strategy that intends to replace the order. On a live account this
/// squares off positions the operator meant to keep open. It exists for
/// exercising the compensation path in test accounts only and must stay
/// disabled anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Treat all cancellations as exchange out-of-range cancellations.
    /// Default: false. TEST ACCOUNTS ONLY.
    #[serde(default)]
    pub watch_manual_cancellations: bool,
}
