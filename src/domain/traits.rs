//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{BackendTxId, LedgerStatus, PriceQuote, SinkOutcome};

/// Ledger gateway trait for finality queries.
///
/// Implementations must tolerate concurrent outstanding queries from
/// multiple monitoring jobs sharing one transport.
#[async_trait]
pub trait LedgerStatusGateway: Send + Sync {
    /// Query finality for a submitted transaction reference, searching the
    /// full transaction history rather than only the recent status cache.
    async fn signature_status(&self, ledger_ref: &str) -> Result<LedgerStatus, AppError>;

    /// Check ledger RPC connectivity
    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::Ledger(super::error::LedgerError::Rpc(
            "health_check not implemented".to_string(),
        )))
    }
}

/// Backend sink trait for idempotent terminal status transitions.
///
/// Both calls must short-circuit with a success-shaped return for
/// synthesized placeholder ids: the backend cannot be addressed by an id it
/// never issued.
#[async_trait]
pub trait BackendStatusSink: Send + Sync {
    /// Mark the backend record confirmed
    async fn confirm(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError>;

    /// Mark the backend record failed
    async fn fail(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError>;
}

/// A single SOL/USD price source. The oracle chains one primary and one
/// secondary source; each source makes exactly one attempt per call.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable source name for logging
    fn name(&self) -> &'static str;

    /// Fetch a fresh quote
    async fn fetch_quote(&self) -> Result<PriceQuote, AppError>;
}
