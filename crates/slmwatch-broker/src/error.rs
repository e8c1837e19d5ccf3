//! Broker error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Broker rejected request ({error_type}): {message}")]
    Rejected { error_type: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Simulated failure: {0}")]
    Simulated(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
