//! Solana JSON-RPC ledger gateway.
//!
//! Wraps the single query the pipeline needs: is this signature finalized,
//! and with what outcome? One shared HTTP client serves all monitoring jobs
//! concurrently.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{AppError, LedgerError, LedgerStatus, LedgerStatusGateway};

/// Configuration for the RPC gateway
#[derive(Debug, Clone)]
pub struct RpcGatewayConfig {
    pub timeout: Duration,
}

impl Default for RpcGatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP-based ledger status gateway
pub struct RpcLedgerGateway {
    http_client: Client,
    rpc_url: String,
}

impl RpcLedgerGateway {
    pub fn new(rpc_url: &str, config: RpcGatewayConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Ledger(LedgerError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }

    pub fn with_defaults(rpc_url: &str) -> Result<Self, AppError> {
        Self::new(rpc_url, RpcGatewayConfig::default())
    }

    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Ledger(LedgerError::Timeout(e.to_string()))
                } else {
                    AppError::Ledger(LedgerError::Connection(e.to_string()))
                }
            })?;

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::Ledger(LedgerError::MalformedResponse(e.to_string())))?;

        if let Some(error) = rpc_response.error {
            return Err(AppError::Ledger(LedgerError::Rpc(format!(
                "{}: {}",
                error.code, error.message
            ))));
        }

        rpc_response.result.ok_or_else(|| {
            AppError::Ledger(LedgerError::MalformedResponse("Empty response".to_string()))
        })
    }
}

#[async_trait]
impl LedgerStatusGateway for RpcLedgerGateway {
    async fn signature_status(&self, ledger_ref: &str) -> Result<LedgerStatus, AppError> {
        // searchTransactionHistory widens the lookup beyond the recent
        // status cache, the fast path for already-finalized transactions
        let result = self
            .send_request(
                "getSignatureStatuses",
                json!([[ledger_ref], {"searchTransactionHistory": true}]),
            )
            .await?;

        let value = result
            .get("value")
            .and_then(|v| v.as_array())
            .and_then(|statuses| statuses.first())
            .ok_or_else(|| {
                AppError::Ledger(LedgerError::MalformedResponse(
                    "Missing value array in getSignatureStatuses result".to_string(),
                ))
            })?;

        // Null status: signature not yet observed. A non-null status with a
        // null err is confirmed; a non-null err is a finalized failure.
        let status = match value {
            serde_json::Value::Null => LedgerStatus::Pending,
            observed => match observed.get("err") {
                None | Some(serde_json::Value::Null) => LedgerStatus::Confirmed,
                Some(err) => LedgerStatus::Failed(err.to_string()),
            },
        };

        debug!(ledger_ref = %ledger_ref, status = %status, "Ledger status resolved");
        Ok(status)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let result = self.send_request("getHealth", json!([])).await?;
        if result.as_str() == Some("ok") {
            Ok(())
        } else {
            Err(AppError::Ledger(LedgerError::Rpc(format!(
                "Unexpected health response: {result}"
            ))))
        }
    }
}
