//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    AppError, BackendError, BackendStatusSink, BackendTxId, LedgerError, LedgerStatus,
    LedgerStatusGateway, PriceQuote, PriceSource, SinkOutcome,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// Ledger gateway that replays a scripted sequence of reads.
///
/// Once the script is exhausted every further read resolves to the default
/// status (Pending unless overridden). An optional per-read delay lets tests
/// cancel a job while a read is still outstanding.
pub struct ScriptedLedgerGateway {
    script: Mutex<VecDeque<LedgerStatus>>,
    default_status: LedgerStatus,
    ref_overrides: HashMap<String, LedgerStatus>,
    read_delay: Option<Duration>,
    calls: AtomicU32,
    config: MockConfig,
}

impl ScriptedLedgerGateway {
    #[must_use]
    pub fn from_script(script: Vec<LedgerStatus>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_status: LedgerStatus::Pending,
            ref_overrides: HashMap::new(),
            read_delay: None,
            calls: AtomicU32::new(0),
            config: MockConfig::success(),
        }
    }

    /// Every read resolves to the same status
    #[must_use]
    pub fn always(status: LedgerStatus) -> Self {
        let mut gateway = Self::from_script(Vec::new());
        gateway.default_status = status;
        gateway
    }

    /// Every read fails with a transport error
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut gateway = Self::from_script(Vec::new());
        gateway.config = MockConfig::failure(message);
        gateway
    }

    /// Delay each read before it resolves
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Pin the status returned for one specific ledger reference, taking
    /// precedence over the script and the default
    #[must_use]
    pub fn with_ref_status(mut self, ledger_ref: &str, status: LedgerStatus) -> Self {
        self.ref_overrides.insert(ledger_ref.to_string(), status);
        self
    }

    /// Number of reads issued so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStatusGateway for ScriptedLedgerGateway {
    async fn signature_status(&self, ledger_ref: &str) -> Result<LedgerStatus, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.ref_overrides.get(ledger_ref) {
            return Ok(status.clone());
        }

        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Ledger(LedgerError::Connection(msg)));
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_status.clone());
        Ok(next)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Backend sink that records every terminal transition it receives.
pub struct RecordingBackendSink {
    confirmed: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
    skipped: Mutex<Vec<String>>,
    config: MockConfig,
}

impl RecordingBackendSink {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            confirmed: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
            skipped: Mutex::new(Vec::new()),
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn confirmed_ids(&self) -> Vec<String> {
        self.confirmed.lock().unwrap().clone()
    }

    pub fn failed_ids(&self) -> Vec<String> {
        self.failed.lock().unwrap().clone()
    }

    pub fn skipped_ids(&self) -> Vec<String> {
        self.skipped.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.confirmed.lock().unwrap().len()
            + self.failed.lock().unwrap().len()
            + self.skipped.lock().unwrap().len()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Backend(BackendError::Status {
                code: 500,
                body: msg,
            }));
        }
        Ok(())
    }

    fn record(&self, bucket: &Mutex<Vec<String>>, id: &BackendTxId) -> Result<SinkOutcome, AppError> {
        if id.is_placeholder() {
            self.skipped.lock().unwrap().push(id.to_string());
            return Ok(SinkOutcome::SkippedPlaceholder);
        }
        self.check_should_fail()?;
        bucket.lock().unwrap().push(id.to_string());
        Ok(SinkOutcome::Updated)
    }
}

impl Default for RecordingBackendSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendStatusSink for RecordingBackendSink {
    async fn confirm(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError> {
        self.record(&self.confirmed, id)
    }

    async fn fail(&self, id: &BackendTxId) -> Result<SinkOutcome, AppError> {
        self.record(&self.failed, id)
    }
}

/// Price source that serves a fixed quote and counts fetch attempts.
/// Failure can be toggled at runtime to exercise the fallback chain.
pub struct StaticPriceSource {
    name: &'static str,
    price: f64,
    calls: AtomicU32,
    should_fail: AtomicBool,
}

impl StaticPriceSource {
    #[must_use]
    pub fn new(name: &'static str, price: f64) -> Self {
        Self {
            name,
            price,
            calls: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn failing(name: &'static str) -> Self {
        let source = Self::new(name, 0.0);
        source.set_failing(true);
        source
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_quote(&self) -> Result<PriceQuote, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(AppError::Price(crate::domain::PriceError::Http(
                "Mock source down".to_string(),
            )));
        }
        Ok(PriceQuote::new(self.price, Some(1.5)))
    }
}
