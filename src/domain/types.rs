//! Core domain types for the confirmation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Point-in-time finality read from the external ledger.
///
/// Finality for this transaction model is binary once observed: a status
/// carrying an error is failed, a status without one is confirmed, and an
/// unobserved signature is pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Signature not yet observed by the ledger
    Pending,
    /// Transaction finalized successfully
    Confirmed,
    /// Transaction finalized with an error
    Failed(String),
}

impl LedgerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered list of JSON paths probed when extracting a transaction id from a
/// loosely-shaped backend response. The backend's schema is not strictly
/// pinned, so each candidate is tried in sequence.
const ID_CANDIDATE_PATHS: &[&[&str]] = &[
    &["id"],
    &["_id"],
    &["transactionId"],
    &["data", "id"],
    &["data", "_id"],
];

/// Prefix marking a locally synthesized placeholder id.
const PLACEHOLDER_PREFIX: &str = "temp_";

/// Identifier of a backend-tracked transaction record.
///
/// May be a locally synthesized placeholder when the backend response did not
/// carry a recognizable id; placeholder ids are never sent back to the
/// backend (it cannot be addressed by an id it never issued).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BackendTxId(String);

impl BackendTxId {
    /// Validate a raw id from upstream. Rejects the malformed shapes that
    /// reach this path via stringified missing values.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "undefined" || trimmed == "null" {
            return Err(ValidationError::InvalidTransactionId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Synthesize a placeholder id of the shape `temp_<shortRef>_<timestamp>`
    /// from the ledger reference, for use when id extraction failed.
    pub fn placeholder(ledger_ref: &str) -> Self {
        let short_ref: String = ledger_ref.chars().take(8).collect();
        Self(format!(
            "{}{}_{}",
            PLACEHOLDER_PREFIX,
            short_ref,
            Utc::now().timestamp_millis()
        ))
    }

    /// Extract an id from an untyped backend response, probing each candidate
    /// path in order. Returns `None` rather than silently defaulting so the
    /// placeholder fallback stays an explicit, testable branch.
    pub fn extract(response: &serde_json::Value) -> Option<Self> {
        for path in ID_CANDIDATE_PATHS {
            let mut node = response;
            let mut found = true;
            for key in *path {
                match node.get(key) {
                    Some(next) => node = next,
                    None => {
                        found = false;
                        break;
                    }
                }
            }
            if !found {
                continue;
            }
            if let Some(raw) = node.as_str()
                && let Ok(id) = Self::parse(raw)
            {
                return Some(id);
            }
        }
        None
    }

    /// Extract an id from a backend response, falling back to a synthesized
    /// placeholder tied to the ledger reference.
    pub fn from_response(response: &serde_json::Value, ledger_ref: &str) -> Self {
        Self::extract(response).unwrap_or_else(|| Self::placeholder(ledger_ref))
    }

    /// Whether this id is a locally synthesized placeholder the backend
    /// cannot be addressed by.
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackendTxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a ledger reference looks like a Base58-encoded Ed25519 signature.
/// Used only to warn early on references that can never confirm.
#[must_use]
pub fn looks_like_signature(ledger_ref: &str) -> bool {
    bs58::decode(ledger_ref)
        .into_vec()
        .map(|bytes| bytes.len() == 64)
        .unwrap_or(false)
}

/// Outcome of a backend sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Backend record transitioned
    Updated,
    /// Placeholder id, call suppressed as a successful no-op
    SkippedPlaceholder,
}

/// Snapshot of the monitor registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringStatus {
    /// Number of in-flight monitoring jobs
    pub active: usize,
    /// Backend transaction ids currently monitored
    pub ids: Vec<String>,
}

/// A SOL/USD quote from a price source. Superseded on refresh, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    /// Price in USD
    pub price: f64,
    /// 24h change in percent, when the source reports one
    pub change_24h: Option<f64>,
    /// When the quote was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    #[must_use]
    pub fn new(price: f64, change_24h: Option<f64>) -> Self {
        Self {
            price,
            change_24h,
            fetched_at: Utc::now(),
        }
    }

    /// Whether the quote is still inside the cache validity window.
    pub fn is_fresh(&self, ttl: std::time::Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age.to_std().map(|age| age < ttl).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_tx_id_parse_rejects_malformed_shapes() {
        assert!(BackendTxId::parse("tr_123").is_ok());
        assert!(BackendTxId::parse("").is_err());
        assert!(BackendTxId::parse("   ").is_err());
        assert!(BackendTxId::parse("undefined").is_err());
        assert!(BackendTxId::parse("null").is_err());
    }

    #[test]
    fn test_placeholder_shape_and_detection() {
        let id = BackendTxId::placeholder("5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d");
        assert!(id.is_placeholder());
        assert!(id.as_str().starts_with("temp_5eykt4Us_"));

        let real = BackendTxId::parse("tr_123").unwrap();
        assert!(!real.is_placeholder());
    }

    #[test]
    fn test_extract_probes_candidate_paths_in_order() {
        let top = json!({"id": "a", "_id": "b", "data": {"id": "c"}});
        assert_eq!(BackendTxId::extract(&top).unwrap().as_str(), "a");

        let underscore = json!({"_id": "b", "data": {"id": "c"}});
        assert_eq!(BackendTxId::extract(&underscore).unwrap().as_str(), "b");

        let nested = json!({"data": {"_id": "e"}});
        assert_eq!(BackendTxId::extract(&nested).unwrap().as_str(), "e");

        let nothing = json!({"status": "created"});
        assert!(BackendTxId::extract(&nothing).is_none());
    }

    #[test]
    fn test_extract_skips_invalid_candidates() {
        // A present but malformed id must not shadow a later valid one
        let response = json!({"id": "undefined", "transactionId": "tr_9"});
        assert_eq!(BackendTxId::extract(&response).unwrap().as_str(), "tr_9");
    }

    #[test]
    fn test_from_response_falls_back_to_placeholder() {
        let response = json!({"ok": true});
        let id = BackendTxId::from_response(&response, "3AsdfQwerty111");
        assert!(id.is_placeholder());
    }

    #[test]
    fn test_looks_like_signature() {
        // 64 bytes of zeros encodes to a run of '1's in Base58
        let sig = bs58::encode([0u8; 64]).into_string();
        assert!(looks_like_signature(&sig));
        assert!(!looks_like_signature("tr_123"));
        assert!(!looks_like_signature("not base58 !!!"));
    }

    #[test]
    fn test_ledger_status_display() {
        assert_eq!(LedgerStatus::Pending.to_string(), "pending");
        assert_eq!(LedgerStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(LedgerStatus::Failed("err".to_string()).to_string(), "failed");
        assert!(LedgerStatus::Confirmed.is_terminal());
        assert!(!LedgerStatus::Pending.is_terminal());
    }

    #[test]
    fn test_price_quote_freshness() {
        let quote = PriceQuote::new(150.0, Some(-2.3));
        assert!(quote.is_fresh(std::time::Duration::from_secs(60)));

        let stale = PriceQuote {
            price: 150.0,
            change_24h: None,
            fetched_at: Utc::now() - chrono::Duration::seconds(120),
        };
        assert!(!stale.is_fresh(std::time::Duration::from_secs(60)));
    }
}
