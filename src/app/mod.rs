//! Application layer containing the confirmation pipeline and shared state.

pub mod monitor;
pub mod reconcile;
pub mod state;

pub use monitor::{MonitorConfig, TransactionMonitor};
pub use reconcile::{FailureReason, TickDecision, evaluate};
pub use state::AppState;
