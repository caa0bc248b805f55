//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, BackendError, ConfigError, LedgerError, PriceError, ValidationError,
};
pub use traits::{BackendStatusSink, LedgerStatusGateway, PriceSource};
pub use types::{
    BackendTxId, LedgerStatus, MonitoringStatus, PriceQuote, SinkOutcome, looks_like_signature,
};
