//! # Shipment Ledger
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! Tracks every shipment from harvest to consumption on the shared ledger:
//! who holds it, which stage it is at, what each handler recorded, what it
//! was made from and whether it is under recall.
//!
//! ## Lifecycle
//!
//! ```text
//!                 ┌──submit──→ PENDING_CERTIFICATION ──certify──→ CERTIFIED / CERTIFICATION_REJECTED
//!                 │                                                   │
//! CREATED ────────┴──────────────process──────────────────────────────┘
//!                                    │
//!                                    ▼
//!                               PROCESSED ──distribute──→ DISTRIBUTED ──receive──→ DELIVERED ──consume──→ CONSUMED
//!                                    │                                                 │
//!                                    └──────────transform (input)──────────────────────┴──→ CONSUMED_IN_PROCESSING
//!
//! any non-terminal status ──recall──→ RECALLED (frozen)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Status matches the stage payloads present | `domain/invariants.rs` on every save |
//! | Each hand-off goes to the nominated party, admins included | `lifecycle.rs`, `cold_chain.rs` |
//! | Recalled shipments never transition again | `lifecycle.rs` - `ensure_not_recalled()` |
//! | Transformation writes nothing unless every input qualifies | `transformation.rs` |
//! | Consumed inputs carry zero quantity | `transformation.rs`, `domain/invariants.rs` |
//! | Timestamps come from the transaction, never the caller | every mutating operation |
//!
//! ## Module Structure
//!
//! ```text
//! ports/inbound.rs   - LifecycleApi, RecallApi, ShipmentQueryApi
//! contract.rs        - FoodtraceContract (implements all three)
//! lifecycle.rs       - stage transitions, archive
//! transformation.rs  - two-phase input spend and derived products
//! recall.rs          - recall, linking, related-shipment inference
//! queries.rs         - listings, details, actionable shipments
//! cold_chain.rs      - distributor sensor logs
//! store.rs           - ShipmentStore over the ledger stub
//! validation.rs      - input payloads and Validator
//! domain/            - Shipment, stage data, statuses, invariants
//! events.rs          - shipment ledger events
//! config.rs          - ContractConfig
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod contract;
pub mod domain;
pub mod events;
pub mod ports;
pub mod store;
pub mod validation;

mod cold_chain;
mod lifecycle;
mod queries;
mod recall;
mod transformation;

#[cfg(test)]
mod test_support;

pub use config::ContractConfig;
pub use contract::{Actor, FoodtraceContract};
pub use domain::*;
pub use events::ShipmentEventKind;
pub use ports::{LifecycleApi, RecallApi, ShipmentQueryApi};
pub use store::ShipmentStore;
pub use validation::{
    CertificationDecision, CertificationInput, DistributorDataInput, FarmerDataInput,
    InputConsumption, NewProduct, NewShipment, ProcessorDataInput, RetailerDataInput,
    SensorLogInput, Validator,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem identifier.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Shipment Ledger";

/// Common imports for contract callers.
pub mod prelude {
    pub use crate::contract::{Actor, FoodtraceContract};
    pub use crate::domain::{Shipment, ShipmentStatus};
    pub use crate::ports::{LifecycleApi, RecallApi, ShipmentQueryApi};
    pub use crate::validation::{
        DistributorDataInput, FarmerDataInput, NewShipment, ProcessorDataInput, RetailerDataInput,
    };
}
