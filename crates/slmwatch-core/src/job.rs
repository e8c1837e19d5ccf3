//! Watcher job input and the job data carried along a compensation chain.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::order::OrderId;

/// Data attached to the job that placed the original order.
///
/// Opaque to the watcher except for `order_tag`, which is stamped on every
/// compensation order so the whole chain stays traceable. The remaining
/// fields are carried forward verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialJobData {
    pub order_tag: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InitialJobData {
    pub fn new(order_tag: impl Into<String>) -> Self {
        Self {
            order_tag: order_tag.into(),
            extra: Map::new(),
        }
    }

    /// Parse job data produced by an upstream job.
    ///
    /// # Errors
    /// `CoreError::MissingJobField` if `orderTag` is absent or not a string.
    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("orderTag") {
            Some(Value::String(_)) => Ok(serde_json::from_value(value)?),
            _ => Err(CoreError::MissingJobField("orderTag".to_string())),
        }
    }
}

/// Account the watched order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    pub user_id: String,
}

impl AccountContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Input for one watcher invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherJobInput {
    pub watched_order_id: OrderId,
    pub account: AccountContext,
    pub initial_job_data: InitialJobData,
}

impl WatcherJobInput {
    pub fn new(
        watched_order_id: OrderId,
        account: AccountContext,
        initial_job_data: InitialJobData,
    ) -> Self {
        Self {
            watched_order_id,
            account,
            initial_job_data,
        }
    }

    /// Next link of the chain: a new order to watch with the same job data.
    pub fn successor(&self, order_id: OrderId) -> Self {
        Self {
            watched_order_id: order_id,
            account: self.account.clone(),
            initial_job_data: self.initial_job_data.clone(),
        }
    }

    pub fn order_tag(&self) -> &str {
        &self.initial_job_data.order_tag
    }
}
