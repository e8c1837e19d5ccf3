//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker error: {0}")]
    Broker(#[from] slmwatch_broker::BrokerError),
}

pub type AppResult<T> = Result<T, AppError>;
