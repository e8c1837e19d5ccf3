//! Kite Connect REST client.
//!
//! Implements [`BrokerClient`] against the Kite Connect v3 HTTP API:
//! - `GET /orders/{order_id}` for order history
//! - `GET /portfolio/positions` for net positions
//! - `POST /orders/regular` for market orders

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slmwatch_core::{
    BrokerConstants, ExitOrderRequest, OrderEvent, OrderId, PlacedOrder, PositionRow,
    PositionSnapshot,
};
use tracing::{debug, info};

use crate::client::{BoxFuture, BrokerClient};
use crate::error::{BrokerError, BrokerResult};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Kite Connect API version header value.
const KITE_VERSION: &str = "3";

/// Connection settings for [`KiteClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiteConfig {
    /// API root (e.g., "https://api.kite.trade").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// App API key.
    #[serde(default)]
    pub api_key: String,
    /// Session access token. Loaded from the environment, never from the config file.
    #[serde(skip)]
    pub access_token: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Status and rejection strings reported by this broker.
    #[serde(default)]
    pub constants: BrokerConstants,
}

fn default_base_url() -> String {
    "https://api.kite.trade".to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for KiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            access_token: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            constants: BrokerConstants::default(),
        }
    }
}

/// Kite response envelope: `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ..., "error_type": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PositionsData {
    #[serde(default)]
    net: Vec<PositionRow>,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderData {
    order_id: String,
}

/// Form body for `POST /orders/regular`.
#[derive(Debug, Serialize)]
struct PlaceOrderForm<'a> {
    tradingsymbol: &'a str,
    exchange: &'a str,
    transaction_type: &'static str,
    order_type: &'static str,
    quantity: u64,
    product: &'a str,
    tag: &'a str,
}

impl<'a> From<&'a ExitOrderRequest> for PlaceOrderForm<'a> {
    fn from(request: &'a ExitOrderRequest) -> Self {
        Self {
            tradingsymbol: &request.trading_symbol,
            exchange: &request.exchange,
            transaction_type: request.transaction_type.as_str(),
            order_type: request.order_type.as_str(),
            quantity: request.quantity,
            product: &request.product,
            tag: &request.tag,
        }
    }
}

/// Kite Connect client for one authenticated session.
///
/// The session belongs to a single user: every watch runs against the
/// configured access token, and `AccountContext` on a job is used for
/// logging only. Watching orders for several users needs one client (and
/// one scheduler) per session.
pub struct KiteClient {
    client: Client,
    config: KiteConfig,
}

impl KiteClient {
    /// Create a new client.
    ///
    /// # Errors
    /// `MissingCredentials` if the API key or access token is empty.
    pub fn new(config: KiteConfig) -> BrokerResult<Self> {
        if config.api_key.is_empty() {
            return Err(BrokerError::MissingCredentials("api_key".to_string()));
        }
        if config.access_token.is_empty() {
            return Err(BrokerError::MissingCredentials("access_token".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BrokerError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        info!(base_url = %config.base_url, "Kite client initialized");
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Kite-Version", KITE_VERSION)
            .header(
                "Authorization",
                format!("token {}:{}", self.config.api_key, self.config.access_token),
            )
    }

    /// Send a request and return the raw JSON body after status checks.
    async fn send(&self, builder: RequestBuilder) -> BrokerResult<serde_json::Value> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| BrokerError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("Failed to parse response: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BrokerResult<T> {
        let body = self.send(self.client.get(self.url(path))).await?;
        unwrap_envelope(body)
    }
}

/// Extract `data` from a Kite envelope.
fn unwrap_envelope<T: DeserializeOwned>(body: serde_json::Value) -> BrokerResult<T> {
    let envelope: Envelope<T> = serde_json::from_value(body)
        .map_err(|e| BrokerError::MalformedResponse(format!("Unexpected envelope: {e}")))?;

    if envelope.status != "success" {
        return Err(BrokerError::Rejected {
            error_type: envelope.error_type.unwrap_or_else(|| "Unknown".to_string()),
            message: envelope.message.unwrap_or_default(),
        });
    }

    envelope
        .data
        .ok_or_else(|| BrokerError::MalformedResponse("response has no data".to_string()))
}

impl BrokerClient for KiteClient {
    fn constants(&self) -> &BrokerConstants {
        &self.config.constants
    }

    fn fetch_order_history<'a>(
        &'a self,
        order_id: &'a OrderId,
    ) -> BoxFuture<'a, BrokerResult<Vec<OrderEvent>>> {
        Box::pin(async move {
            let history: Vec<OrderEvent> = self.get(&format!("/orders/{order_id}")).await?;
            debug!(order_id = %order_id, events = history.len(), "Fetched order history");
            Ok(history)
        })
    }

    fn fetch_open_positions(&self) -> BoxFuture<'_, BrokerResult<PositionSnapshot>> {
        Box::pin(async move {
            let positions: PositionsData = self.get("/portfolio/positions").await?;
            debug!(rows = positions.net.len(), "Fetched net positions");
            Ok(PositionSnapshot::new(positions.net))
        })
    }

    fn place_market_order<'a>(
        &'a self,
        request: &'a ExitOrderRequest,
    ) -> BoxFuture<'a, BrokerResult<PlacedOrder>> {
        Box::pin(async move {
            let form = PlaceOrderForm::from(request);
            let body = self
                .send(self.client.post(self.url("/orders/regular")).form(&form))
                .await?;

            let data: PlaceOrderData = unwrap_envelope(body.clone())?;
            let order_id = OrderId::parse(data.order_id)
                .map_err(|e| BrokerError::MalformedResponse(e.to_string()))?;

            Ok(PlacedOrder {
                order_id,
                raw_confirmation: body,
            })
        })
    }
}
