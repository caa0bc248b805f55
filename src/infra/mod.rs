//! Infrastructure layer: concrete adapters for external systems.

pub mod backend;
pub mod ledger;
pub mod price;

pub use backend::{BackendSinkConfig, HttpBackendSink};
pub use ledger::{RpcGatewayConfig, RpcLedgerGateway};
pub use price::{CoinGeckoSource, JupiterSource, PriceOracle};
