//! Error taxonomy for the confirmation pipeline.
//!
//! Transport errors from either gateway are recovered locally by the polling
//! loop (they count as a retry attempt); a ledger-reported failure is a valid
//! terminal outcome, not an error; invalid transaction ids are logged and
//! abandoned without crashing the monitor loop.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the external ledger gateway
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from the backend status sink
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from the price oracle sources
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid price data: {0}")]
    InvalidData(String),

    #[error("No price available from any source: {0}")]
    Unavailable(String),
}

/// Input validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid transaction id: {0:?}")]
    InvalidTransactionId(String),
}

/// Configuration errors (wiring defects, fatal at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
