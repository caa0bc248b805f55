//! Monitor registry and polling scheduler.
//!
//! One tokio task per registered transaction drives the polling loop: an
//! immediate check at registration, then fixed-interval ticks until the
//! reconciliation state machine retires the job. Ticks for one job never
//! overlap because the job's own task is the only trigger.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{
    BackendStatusSink, BackendTxId, LedgerStatus, LedgerStatusGateway, MonitoringStatus,
    SinkOutcome, looks_like_signature,
};

use super::reconcile::{FailureReason, TickDecision, evaluate};

/// Configuration for the polling scheduler.
///
/// Budget x interval bounds the worst-case monitoring duration (default
/// 12 x 5s = 60s), trading detection latency against indefinite polling.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between status checks per job
    pub check_interval: Duration,
    /// Maximum polling attempts before a pending transaction is
    /// terminalized as failed
    pub retry_budget: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            retry_budget: 12,
        }
    }
}

/// Registry entry for an in-flight monitoring job. Dropping the cancel
/// sender (on removal) also wakes the job's task.
///
/// The generation distinguishes this job from any earlier job registered
/// under the same id, so a stop-then-re-register cannot be terminalized by
/// the replaced job's still-outstanding read.
struct JobHandle {
    ledger_ref: String,
    generation: u64,
    cancel_tx: watch::Sender<bool>,
}

/// Everything a job task needs, detached from the monitor's lifetime.
struct JobContext {
    ledger: Arc<dyn LedgerStatusGateway>,
    sink: Arc<dyn BackendStatusSink>,
    jobs: Arc<DashMap<BackendTxId, JobHandle>>,
    config: MonitorConfig,
}

/// Transaction confirmation monitor.
///
/// Owns the registry of in-flight jobs keyed by backend transaction id and
/// guarantees at most one job, and at most one terminal backend-sink call,
/// per id. Construction wires the ledger transport and backend sink, so a
/// monitor can never be used uninitialized.
pub struct TransactionMonitor {
    ledger: Arc<dyn LedgerStatusGateway>,
    sink: Arc<dyn BackendStatusSink>,
    config: MonitorConfig,
    jobs: Arc<DashMap<BackendTxId, JobHandle>>,
    next_generation: AtomicU64,
}

impl TransactionMonitor {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerStatusGateway>,
        sink: Arc<dyn BackendStatusSink>,
        config: MonitorConfig,
    ) -> Self {
        info!(
            interval_ms = config.check_interval.as_millis() as u64,
            retry_budget = config.retry_budget,
            "Transaction monitor initialized"
        );
        Self {
            ledger,
            sink,
            config,
            jobs: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Start monitoring a submitted transaction.
    ///
    /// Returns `true` if a new job was registered. Duplicate registrations
    /// (component re-mounts, double submissions) are logged no-ops, and a
    /// malformed id is logged and abandoned rather than crashing the caller.
    #[instrument(skip(self))]
    pub fn start_monitoring(&self, raw_id: &str, ledger_ref: &str) -> bool {
        let id = match BackendTxId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                error!(raw_id = %raw_id, error = %e, "Refusing to monitor malformed transaction id");
                return false;
            }
        };

        if !looks_like_signature(ledger_ref) {
            // Such a reference can only ever exhaust the retry budget
            warn!(id = %id, ledger_ref = %ledger_ref, "Ledger reference does not look like a signature");
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        match self.jobs.entry(id.clone()) {
            Entry::Occupied(_) => {
                warn!(id = %id, "Transaction already monitored, ignoring duplicate registration");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(JobHandle {
                    ledger_ref: ledger_ref.to_string(),
                    generation,
                    cancel_tx,
                });
            }
        }

        info!(
            id = %id,
            ledger_ref = %ledger_ref,
            active = self.jobs.len(),
            "Started confirmation monitoring"
        );

        let ctx = JobContext {
            ledger: Arc::clone(&self.ledger),
            sink: Arc::clone(&self.sink),
            jobs: Arc::clone(&self.jobs),
            config: self.config.clone(),
        };
        tokio::spawn(run_job(ctx, id, ledger_ref.to_string(), generation, cancel_rx));
        true
    }

    /// Normalize a loosely-shaped submission response and start monitoring
    /// the transaction it describes. Falls back to a synthesized placeholder
    /// id when no recognizable id is present, so terminal outcomes are still
    /// observed locally even if the backend cannot be notified.
    pub fn start_monitoring_from_response(
        &self,
        response: &serde_json::Value,
        ledger_ref: &str,
    ) -> BackendTxId {
        let id = BackendTxId::from_response(response, ledger_ref);
        if id.is_placeholder() {
            warn!(id = %id, "Backend response carried no usable id, monitoring under placeholder");
        }
        self.start_monitoring(id.as_str(), ledger_ref);
        id
    }

    /// Stop monitoring a single transaction. Safe to call while a tick is in
    /// flight; the cancelled tick completes as a no-op.
    #[instrument(skip(self))]
    pub fn stop_monitoring(&self, raw_id: &str) {
        let Ok(id) = BackendTxId::parse(raw_id) else {
            return;
        };
        if let Some((id, handle)) = self.jobs.remove(&id) {
            let _ = handle.cancel_tx.send(true);
            info!(id = %id, ledger_ref = %handle.ledger_ref, "Stopped monitoring transaction");
        }
    }

    /// Stop every monitoring job and release its scheduler. Used at teardown
    /// of the owning context to guarantee no polling outlives it.
    pub fn stop_all(&self) {
        let count = self.jobs.len();
        for entry in self.jobs.iter() {
            let _ = entry.value().cancel_tx.send(true);
        }
        self.jobs.clear();
        info!(stopped = count, "Stopped all transaction monitoring");
    }

    /// Snapshot of the registry.
    pub fn monitoring_status(&self) -> MonitoringStatus {
        MonitoringStatus {
            active: self.jobs.len(),
            ids: self.jobs.iter().map(|e| e.key().to_string()).collect(),
        }
    }

    /// Whether a job is registered for this id.
    pub fn is_monitoring(&self, raw_id: &str) -> bool {
        BackendTxId::parse(raw_id)
            .map(|id| self.jobs.contains_key(&id))
            .unwrap_or(false)
    }
}

/// Per-job polling loop. Runs until the state machine retires the job or
/// cancellation wakes it.
async fn run_job(
    ctx: JobContext,
    id: BackendTxId,
    ledger_ref: String,
    generation: u64,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let budget = ctx.config.retry_budget;
    let mut retry_count: u32 = 0;

    loop {
        let read = tokio::select! {
            _ = cancel_rx.changed() => {
                debug!(id = %id, "Monitoring cancelled during ledger read");
                return;
            }
            read = ctx.ledger.signature_status(&ledger_ref) => read,
        };

        // A tick that was cancelled while its read was outstanding must not
        // act on the result. The generation check also covers the id being
        // re-registered in the meantime; the stale tick must not touch the
        // replacement job.
        let registered = ctx
            .jobs
            .get(&id)
            .is_some_and(|handle| handle.generation == generation);
        if !registered {
            debug!(id = %id, generation, "Job no longer registered, discarding resolved read");
            return;
        }

        let status = match read {
            Ok(status) => status,
            Err(e) => {
                // Network flakiness is expected; it consumes budget like an
                // unobserved signature instead of aborting the loop.
                warn!(
                    id = %id,
                    attempt = retry_count + 1,
                    budget,
                    error = %e,
                    "Ledger status check failed, counting as missed attempt"
                );
                LedgerStatus::Pending
            }
        };

        match evaluate(&status, retry_count, budget) {
            TickDecision::KeepPolling { retry_count: next } => {
                retry_count = next;
                debug!(id = %id, attempt = retry_count, budget, "Transaction still pending");
            }
            TickDecision::Confirm => {
                // Retire before notifying so no tick can fire afterwards;
                // only this job's own registration may be retired
                if ctx.jobs.remove_if(&id, |_, h| h.generation == generation).is_none() {
                    return;
                }
                info!(id = %id, ledger_ref = %ledger_ref, "Transaction confirmed on ledger");
                notify_confirmed(&ctx, &id).await;
                return;
            }
            TickDecision::Fail(reason) => {
                if ctx.jobs.remove_if(&id, |_, h| h.generation == generation).is_none() {
                    return;
                }
                warn!(id = %id, ledger_ref = %ledger_ref, reason = %reason, "Transaction failed");
                notify_failed(&ctx, &id, &reason).await;
                return;
            }
        }

        tokio::select! {
            _ = cancel_rx.changed() => {
                debug!(id = %id, "Monitoring cancelled between ticks");
                return;
            }
            _ = tokio::time::sleep(ctx.config.check_interval) => {}
        }
    }
}

/// Best-effort backend notification: the terminal decision was made from the
/// ledger's authoritative answer, so a failed sink call is logged but never
/// re-queues the job.
async fn notify_confirmed(ctx: &JobContext, id: &BackendTxId) {
    match ctx.sink.confirm(id).await {
        Ok(SinkOutcome::Updated) => info!(id = %id, "Backend record marked confirmed"),
        Ok(SinkOutcome::SkippedPlaceholder) => {
            warn!(id = %id, "Placeholder id, backend confirmation skipped");
        }
        Err(e) => {
            error!(id = %id, error = %e, "Failed to mark backend record confirmed");
        }
    }
}

async fn notify_failed(ctx: &JobContext, id: &BackendTxId, reason: &FailureReason) {
    match ctx.sink.fail(id).await {
        Ok(SinkOutcome::Updated) => info!(id = %id, reason = %reason, "Backend record marked failed"),
        Ok(SinkOutcome::SkippedPlaceholder) => {
            warn!(id = %id, "Placeholder id, backend failure notice skipped");
        }
        Err(e) => {
            error!(id = %id, error = %e, "Failed to mark backend record failed");
        }
    }
}
