//! Test utilities exposed behind the `test-utils` feature.

pub mod mocks;

pub use mocks::{MockConfig, RecordingBackendSink, ScriptedLedgerGateway, StaticPriceSource};
