//! Application state management.
//!
//! Process-wide services are carried in one explicitly constructed context
//! object and threaded into whatever needs them, so teardown and test
//! isolation stay clean (no module-level singletons).

use std::sync::Arc;

use crate::domain::{BackendStatusSink, LedgerStatusGateway};
use crate::infra::price::PriceOracle;

use super::monitor::{MonitorConfig, TransactionMonitor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<TransactionMonitor>,
    pub ledger: Arc<dyn LedgerStatusGateway>,
    pub sink: Arc<dyn BackendStatusSink>,
    /// Optional SOL/USD price oracle for display concerns
    pub price_oracle: Option<Arc<PriceOracle>>,
}

impl AppState {
    /// Create a new application state; constructing the monitor here is the
    /// single initialization point for the pipeline.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerStatusGateway>,
        sink: Arc<dyn BackendStatusSink>,
        monitor_config: MonitorConfig,
    ) -> Self {
        let monitor = Arc::new(TransactionMonitor::new(
            Arc::clone(&ledger),
            Arc::clone(&sink),
            monitor_config,
        ));
        Self {
            monitor,
            ledger,
            sink,
            price_oracle: None,
        }
    }

    /// Add a price oracle to the application state (builder pattern)
    #[must_use]
    pub fn with_price_oracle(mut self, price_oracle: Arc<PriceOracle>) -> Self {
        self.price_oracle = Some(price_oracle);
        self
    }

    /// Teardown hook: stop every monitoring job so no timer outlives the
    /// owning context.
    pub fn shutdown(&self) {
        self.monitor.stop_all();
    }
}
