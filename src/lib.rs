//! Transaction confirmation pipeline for Solana-backed value transfers.
//!
//! Given a submitted transaction reference, the pipeline polls the ledger
//! for finality, reconciles the observed outcome with the authoritative
//! backend record, and guarantees the record reaches a terminal state
//! (confirmed or failed) exactly once, despite network flakiness, duplicate
//! submissions, and a bounded retry budget. A small SOL/USD price oracle
//! with a time-boxed cache rides along as a parallel concern.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{AppState, MonitorConfig, TransactionMonitor};
pub use config::Settings;
pub use domain::{AppError, BackendTxId, LedgerStatus, MonitoringStatus, PriceQuote};
