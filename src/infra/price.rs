//! SOL/USD price oracle with a time-boxed cache and a two-level source
//! fallback chain.
//!
//! Single-shot by design: one attempt against the primary source, one
//! against the secondary, then the last-known quote regardless of staleness.
//! No retry loop, unlike the confirmation monitor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AppError, PriceError, PriceQuote, PriceSource};

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_JUPITER_URL: &str = "https://price.jup.ag/v4";

/// CoinGecko simple-price source (free tier, no API key)
pub struct CoinGeckoSource {
    http_client: Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    solana: Option<CoinGeckoPrice>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoPrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch_quote(&self) -> Result<PriceQuote, AppError> {
        let url = format!(
            "{}/simple/price?ids=solana&vs_currencies=usd&include_24hr_change=true",
            self.base_url
        );
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Price(PriceError::Http(e.to_string())))?;

        if !response.status().is_success() {
            return Err(AppError::Price(PriceError::Http(format!(
                "status {}",
                response.status()
            ))));
        }

        let body: CoinGeckoResponse = response
            .json()
            .await
            .map_err(|e| AppError::Price(PriceError::InvalidData(e.to_string())))?;

        let entry = body
            .solana
            .ok_or_else(|| AppError::Price(PriceError::InvalidData("missing solana entry".to_string())))?;
        let price = entry
            .usd
            .filter(|p| *p > 0.0)
            .ok_or_else(|| AppError::Price(PriceError::InvalidData("missing or non-positive usd price".to_string())))?;

        Ok(PriceQuote::new(price, entry.usd_24h_change))
    }
}

/// Jupiter price source (Solana ecosystem), no 24h change field
pub struct JupiterSource {
    http_client: Client,
    base_url: String,
}

impl JupiterSource {
    pub fn new(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JupiterResponse {
    data: Option<JupiterData>,
}

#[derive(Debug, Deserialize)]
struct JupiterData {
    #[serde(rename = "SOL")]
    sol: Option<JupiterPrice>,
}

#[derive(Debug, Deserialize)]
struct JupiterPrice {
    price: Option<f64>,
}

#[async_trait]
impl PriceSource for JupiterSource {
    fn name(&self) -> &'static str {
        "jupiter"
    }

    async fn fetch_quote(&self) -> Result<PriceQuote, AppError> {
        let url = format!("{}/price?ids=SOL", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Price(PriceError::Http(e.to_string())))?;

        if !response.status().is_success() {
            return Err(AppError::Price(PriceError::Http(format!(
                "status {}",
                response.status()
            ))));
        }

        let body: JupiterResponse = response
            .json()
            .await
            .map_err(|e| AppError::Price(PriceError::InvalidData(e.to_string())))?;

        let price = body
            .data
            .and_then(|d| d.sol)
            .and_then(|s| s.price)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| AppError::Price(PriceError::InvalidData("missing or non-positive SOL price".to_string())))?;

        Ok(PriceQuote::new(price, None))
    }
}

/// Price oracle with cache and fallback chain
pub struct PriceOracle {
    primary: Arc<dyn PriceSource>,
    secondary: Arc<dyn PriceSource>,
    ttl: Duration,
    cache: Mutex<Option<PriceQuote>>,
}

impl PriceOracle {
    #[must_use]
    pub fn new(primary: Arc<dyn PriceSource>, secondary: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            primary,
            secondary,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Build the production oracle: CoinGecko primary, Jupiter secondary,
    /// one shared HTTP client.
    pub fn with_default_sources(
        http_client: Client,
        coingecko_url: &str,
        jupiter_url: &str,
        ttl: Duration,
    ) -> Self {
        Self::new(
            Arc::new(CoinGeckoSource::new(http_client.clone(), coingecko_url)),
            Arc::new(JupiterSource::new(http_client, jupiter_url)),
            ttl,
        )
    }

    /// Get a SOL/USD quote.
    ///
    /// A quote inside the validity window is served without any outbound
    /// call. On expiry the primary is tried, then exactly one secondary; if
    /// both fail the last-known quote is preferred over failure, however
    /// stale. Fails only if no quote was ever obtained.
    #[instrument(skip(self))]
    pub async fn get_quote(&self) -> Result<PriceQuote, AppError> {
        let cached = self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(quote) = &cached
            && quote.is_fresh(self.ttl)
        {
            debug!(price = quote.price, "Serving cached SOL quote");
            return Ok(quote.clone());
        }

        match self.primary.fetch_quote().await {
            Ok(quote) => {
                info!(source = self.primary.name(), price = quote.price, "SOL quote refreshed");
                self.store(quote.clone());
                return Ok(quote);
            }
            Err(e) => {
                warn!(source = self.primary.name(), error = %e, "Primary price source failed");
            }
        }

        match self.secondary.fetch_quote().await {
            Ok(quote) => {
                info!(source = self.secondary.name(), price = quote.price, "SOL quote refreshed via fallback");
                self.store(quote.clone());
                return Ok(quote);
            }
            Err(e) => {
                warn!(source = self.secondary.name(), error = %e, "Secondary price source failed");
            }
        }

        if let Some(stale) = cached {
            warn!(
                price = stale.price,
                fetched_at = %stale.fetched_at,
                "All price sources failed, serving stale quote"
            );
            return Ok(stale);
        }

        Err(AppError::Price(PriceError::Unavailable(
            "all sources failed and no quote was ever cached".to_string(),
        )))
    }

    /// Drop the cached quote, forcing the next call outbound.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).take();
        debug!("Price cache cleared");
    }

    fn store(&self, quote: PriceQuote) {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = Some(quote);
    }
}
