//! Environment-driven configuration.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

use crate::app::MonitorConfig;
use crate::domain::ConfigError;
use crate::infra::price::{DEFAULT_COINGECKO_URL, DEFAULT_JUPITER_URL};

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Solana RPC endpoint for finality queries
    pub solana_rpc_url: String,
    /// Base URL of the backend transaction record API
    pub backend_api_url: String,
    /// Optional bearer token for the backend API
    pub backend_auth_token: Option<SecretString>,
    /// Timeout for outbound HTTP calls
    pub http_timeout: Duration,
    /// Polling scheduler configuration
    pub monitor: MonitorConfig,
    /// Price cache validity window
    pub price_cache_ttl: Duration,
    pub coingecko_api_url: String,
    pub jupiter_api_url: String,
}

impl Settings {
    /// Load settings from the environment. Only the backend API base URL is
    /// required; everything else has production defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_api_url = env::var("BACKEND_API_URL")
            .map_err(|_| ConfigError::Missing("BACKEND_API_URL not set".to_string()))?;

        let solana_rpc_url = env::var("SOLANA_RPC_URL")
            .unwrap_or_else(|_| "https://api.devnet.solana.com".to_string());

        let backend_auth_token = env::var("BACKEND_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let http_timeout = Duration::from_secs(
            env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        );

        let check_interval = Duration::from_millis(
            env::var("MONITOR_CHECK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5_000),
        );

        let retry_budget = env::var("MONITOR_RETRY_BUDGET")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(12);
        if retry_budget == 0 {
            return Err(ConfigError::Invalid(
                "MONITOR_RETRY_BUDGET must be at least 1".to_string(),
            ));
        }

        let price_cache_ttl = Duration::from_secs(
            env::var("PRICE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        );

        let coingecko_api_url =
            env::var("COINGECKO_API_URL").unwrap_or_else(|_| DEFAULT_COINGECKO_URL.to_string());
        let jupiter_api_url =
            env::var("JUPITER_API_URL").unwrap_or_else(|_| DEFAULT_JUPITER_URL.to_string());

        Ok(Self {
            solana_rpc_url,
            backend_api_url,
            backend_auth_token,
            http_timeout,
            monitor: MonitorConfig {
                check_interval,
                retry_budget,
            },
            price_cache_ttl,
            coingecko_api_url,
            jupiter_api_url,
        })
    }
}
