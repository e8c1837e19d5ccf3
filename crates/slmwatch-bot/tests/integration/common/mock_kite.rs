//! Mock Kite Connect API for integration tests.
//!
//! Serves the three endpoints the watcher uses:
//! - `GET /orders/{id}` from scripted histories
//! - `GET /portfolio/positions` from scripted net rows
//! - `POST /orders/regular`, recording the form body and answering with a
//!   new order id whose history is already COMPLETE

use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

#[derive(Default)]
struct State {
    histories: HashMap<String, Value>,
    positions: Vec<Value>,
    placed_forms: Vec<String>,
    authorizations: Vec<String>,
    next_order_seq: u64,
}

/// A mock Kite HTTP server for testing.
pub struct MockKiteServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    state: Arc<Mutex<State>>,
}

impl MockKiteServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let state_clone = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            tokio::spawn(handle_connection(stream, state_clone.clone()));
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            state,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Script the history of `order_id` (oldest first).
    pub async fn set_history(&self, order_id: &str, events: Vec<Value>) {
        self.state
            .lock()
            .await
            .histories
            .insert(order_id.to_string(), Value::Array(events));
    }

    pub async fn set_positions(&self, rows: Vec<Value>) {
        self.state.lock().await.positions = rows;
    }

    /// Form bodies of every placement request.
    pub async fn placed_forms(&self) -> Vec<String> {
        self.state.lock().await.placed_forms.clone()
    }

    /// Authorization headers of every request.
    pub async fn authorizations(&self) -> Vec<String> {
        self.state.lock().await.authorizations.clone()
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Order event in Kite's order history shape.
pub fn order_event(order_id: &str, status: &str, cancelled: u64, message: Option<&str>) -> Value {
    json!({
        "order_id": order_id,
        "status": status,
        "cancelled_quantity": cancelled,
        "status_message_raw": message,
        "transaction_type": "SELL",
        "tradingsymbol": "INFY",
        "exchange": "NSE",
        "product": "MIS",
        "order_type": "SL-M",
        "quantity": 10
    })
}

/// Net position row in Kite's positions shape.
pub fn position_row(quantity: i64) -> Value {
    json!({
        "tradingsymbol": "INFY",
        "exchange": "NSE",
        "product": "MIS",
        "quantity": quantity,
        "average_price": 1500.5
    })
}

struct Request {
    method: String,
    path: String,
    authorization: String,
    body: String,
}

async fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut authorization = String::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = value.to_string();
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(Request {
        method,
        path,
        authorization,
        body,
    })
}

async fn handle_connection(mut stream: TcpStream, state: Arc<Mutex<State>>) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };

    let (status, body) = {
        let mut state = state.lock().await;
        state.authorizations.push(request.authorization.clone());
        route(&mut state, &request)
    };

    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn route(state: &mut State, request: &Request) -> (&'static str, Value) {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/portfolio/positions") => (
            "200 OK",
            json!({ "status": "success", "data": { "net": state.positions, "day": [] } }),
        ),
        ("POST", "/orders/regular") => {
            state.placed_forms.push(request.body.clone());
            state.next_order_seq += 1;
            let order_id = format!("MOCK-{}", state.next_order_seq);
            state.histories.insert(
                order_id.clone(),
                json!([order_event(&order_id, "COMPLETE", 0, None)]),
            );
            (
                "200 OK",
                json!({ "status": "success", "data": { "order_id": order_id } }),
            )
        }
        ("GET", path) if path.starts_with("/orders/") => {
            let order_id = &path["/orders/".len()..];
            match state.histories.get(order_id) {
                Some(history) => (
                    "200 OK",
                    json!({ "status": "success", "data": history }),
                ),
                None => (
                    "404 Not Found",
                    json!({
                        "status": "error",
                        "message": "Couldn't find that order.",
                        "error_type": "GeneralException"
                    }),
                ),
            }
        }
        _ => (
            "404 Not Found",
            json!({ "status": "error", "message": "Route not found", "error_type": "GeneralException" }),
        ),
    }
}
