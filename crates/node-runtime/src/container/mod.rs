//! # Node Container
//!
//! Configuration and the transaction service that owns the ledger, the
//! contract and the event publisher.
//!
//! ```text
//! NodeConfig ──from_config()──→ FoodtraceService<P: EventPublisher>
//!                                   ├── InMemoryLedger
//!                                   ├── FoodtraceContract
//!                                   └── Arc<P>  (event bus)
//! ```

pub mod config;
pub mod service;

pub use config::{ConfigError, EventBusConfig, LedgerConfig, LoggingConfig, NodeConfig};
pub use service::{FoodtraceService, ServiceError, ServiceStats, SubmitOutcome};
