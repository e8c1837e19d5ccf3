//! Order-related types and identifiers.
//!
//! Provides the exchange-reported order history types, broker constants,
//! and the compensation order request for the watcher.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Parse an order id, rejecting empty or whitespace-only input.
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CoreError::InvalidOrderId("order id is empty".to_string()));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Broker-defined strings used to interpret order history.
///
/// These are opaque configuration: the watcher never compares a status or
/// rejection message against a literal, only against these values.
/// Defaults are the Kite Connect values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConstants {
    /// Status of an order that has fully executed.
    #[serde(default = "default_status_completed")]
    pub status_completed: String,
    /// Marker contained in every cancellation status.
    #[serde(default = "default_status_cancelled")]
    pub status_cancelled: String,
    /// Raw status message of an exchange cancellation caused by the price
    /// being outside the permitted execution range.
    #[serde(default = "default_out_of_range_message")]
    pub out_of_range_message: String,
}

fn default_status_completed() -> String {
    "COMPLETE".to_string()
}

fn default_status_cancelled() -> String {
    "CANCELLED".to_string()
}

fn default_out_of_range_message() -> String {
    "17070 : The Price is out of the current execution range".to_string()
}

impl Default for BrokerConstants {
    fn default() -> Self {
        Self {
            status_completed: default_status_completed(),
            status_cancelled: default_status_cancelled(),
            out_of_range_message: default_out_of_range_message(),
        }
    }
}

/// Raw order status as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact match against the broker's completed status.
    pub fn is_completed(&self, constants: &BrokerConstants) -> bool {
        self.0 == constants.status_completed
    }

    /// Any status in the cancellation family (e.g. `CANCELLED`, `CANCELLED AMO`).
    pub fn is_cancelled(&self, constants: &BrokerConstants) -> bool {
        self.0.contains(constants.status_cancelled.as_str())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "MARKET")]
    Market,
    #[serde(rename = "LIMIT")]
    Limit,
    /// Stop-loss limit.
    #[serde(rename = "SL")]
    StopLoss,
    /// Stop-loss market.
    #[serde(rename = "SL-M")]
    StopLossMarket,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::StopLoss => "SL",
            Self::StopLossMarket => "SL-M",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical state snapshot of an order, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Quantity cancelled by the time of this snapshot. `null` on the wire reads as 0.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cancelled_quantity: u64,
    #[serde(default)]
    pub status_message_raw: Option<String>,
    pub transaction_type: TransactionType,
    #[serde(rename = "tradingsymbol")]
    pub trading_symbol: String,
    pub exchange: String,
    pub product: String,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Market order that closes the quantity a cancelled exit order failed to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitOrderRequest {
    #[serde(rename = "tradingsymbol")]
    pub trading_symbol: String,
    pub exchange: String,
    pub product: String,
    pub quantity: u64,
    pub transaction_type: TransactionType,
    pub order_type: OrderType,
    pub tag: String,
}

impl ExitOrderRequest {
    /// Build a market exit order for the instrument of `event`.
    ///
    /// # Errors
    /// `CoreError::InvalidQuantity` if `quantity` is zero.
    pub fn market(event: &OrderEvent, quantity: u64, tag: impl Into<String>) -> Result<Self> {
        if quantity == 0 {
            return Err(CoreError::InvalidQuantity(
                "exit order quantity must be positive".to_string(),
            ));
        }
        Ok(Self {
            trading_symbol: event.trading_symbol.clone(),
            exchange: event.exchange.clone(),
            product: event.product.clone(),
            quantity,
            transaction_type: event.transaction_type,
            order_type: OrderType::Market,
            tag: tag.into(),
        })
    }
}

/// Broker confirmation for a newly placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// Full response body, kept for the successor job.
    pub raw_confirmation: serde_json::Value,
}
