//! Application entry point.
//!
//! Operational watcher: takes `backendTxId=ledgerRef` pairs on the command
//! line, monitors each until the backend record reaches a terminal state,
//! and exits once all are resolved or a shutdown signal arrives.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use solana_confirmation_monitor::app::AppState;
use solana_confirmation_monitor::config::Settings;
use solana_confirmation_monitor::infra::{
    BackendSinkConfig, HttpBackendSink, PriceOracle, RpcGatewayConfig, RpcLedgerGateway,
};

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Parse `backendTxId=ledgerRef` command-line pairs.
fn parse_watch_args(args: impl Iterator<Item = String>) -> Vec<(String, String)> {
    args.filter_map(|arg| {
        match arg.split_once('=') {
            Some((id, ledger_ref)) if !id.is_empty() && !ledger_ref.is_empty() => {
                Some((id.to_string(), ledger_ref.to_string()))
            }
            _ => {
                warn!(arg = %arg, "Ignoring argument, expected backendTxId=ledgerRef");
                None
            }
        }
    })
    .collect()
}

/// Wait until every monitoring job has resolved.
async fn wait_for_resolution(state: &AppState) {
    loop {
        let status = state.monitor.monitoring_status();
        if status.active == 0 {
            return;
        }
        info!(active = status.active, "Waiting for transactions to resolve");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Solana confirmation monitor v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::from_env().context("Failed to load configuration")?;

    let ledger = RpcLedgerGateway::new(
        &settings.solana_rpc_url,
        RpcGatewayConfig {
            timeout: settings.http_timeout,
        },
    )
    .context("Failed to create ledger gateway")?;

    let sink = HttpBackendSink::new(
        &settings.backend_api_url,
        settings.backend_auth_token.clone(),
        BackendSinkConfig {
            timeout: settings.http_timeout,
        },
    )
    .context("Failed to create backend sink")?;

    let price_client = reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .build()
        .context("Failed to create price HTTP client")?;
    let price_oracle = Arc::new(PriceOracle::with_default_sources(
        price_client,
        &settings.coingecko_api_url,
        &settings.jupiter_api_url,
        settings.price_cache_ttl,
    ));

    let state = AppState::new(Arc::new(ledger), Arc::new(sink), settings.monitor.clone())
        .with_price_oracle(Arc::clone(&price_oracle));

    match price_oracle.get_quote().await {
        Ok(quote) => info!(
            price = quote.price,
            change_24h = ?quote.change_24h,
            "Current SOL/USD quote"
        ),
        Err(e) => warn!(error = %e, "Could not fetch SOL/USD quote"),
    }

    let watched = parse_watch_args(env::args().skip(1));
    if watched.is_empty() {
        warn!("No transactions to watch, pass backendTxId=ledgerRef pairs");
        return Ok(());
    }

    for (id, ledger_ref) in &watched {
        state.monitor.start_monitoring(id, ledger_ref);
    }
    info!(count = watched.len(), "Watching submitted transactions");

    tokio::select! {
        () = wait_for_resolution(&state) => {
            info!("All transactions resolved");
        }
        () = shutdown_signal() => {
            info!("Shutting down with transactions still pending");
        }
    }

    state.shutdown();
    info!("Monitor shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_args() {
        let parsed = parse_watch_args(
            vec![
                "tr_1=5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d".to_string(),
                "malformed".to_string(),
                "=missing_id".to_string(),
            ]
            .into_iter(),
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "tr_1");
    }
}
