//! Domain layer for shipments.

pub mod entities;
pub mod invariants;
pub mod status;

pub use entities::*;
pub use invariants::check_stage_consistency;
pub use status::{CertificationStatus, ShipmentStatus};
