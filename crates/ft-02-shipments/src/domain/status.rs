//! Shipment and certification status enums.
//!
//! ```text
//! CREATED ──submit──→ PENDING_CERTIFICATION ──record──→ CERTIFIED | CERTIFICATION_REJECTED
//!    │                       ↑                              │
//!    │                       └──────── submit ─────┐        │
//!    └──────────process──────────→ PROCESSED ←─────┴─process┘
//!                                     │
//!                              distribute → DISTRIBUTED → receive → DELIVERED → consume → CONSUMED
//!
//! transform:  {DELIVERED | PROCESSED | CERTIFIED} ──→ CONSUMED_IN_PROCESSING
//! recall:     any non-terminal ──→ RECALLED (absorbing)
//! ```

use serde::{Deserialize, Serialize};
use shared_types::ContractError;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// Registered by a farmer.
    Created,
    /// Awaiting a certifier decision.
    PendingCertification,
    /// Approved by a certifier.
    Certified,
    /// Rejected by a certifier.
    CertificationRejected,
    /// Processed, or created by a transformation.
    Processed,
    /// Picked up by a distributor.
    Distributed,
    /// Received by a retailer.
    Delivered,
    /// Sold or used up at retail. Terminal.
    Consumed,
    /// Under recall. Absorbing.
    Recalled,
    /// Spent as a transformation input. Terminal.
    ConsumedInProcessing,
}

impl ShipmentStatus {
    /// Every status.
    pub const ALL: [ShipmentStatus; 10] = [
        Self::Created,
        Self::PendingCertification,
        Self::Certified,
        Self::CertificationRejected,
        Self::Processed,
        Self::Distributed,
        Self::Delivered,
        Self::Consumed,
        Self::Recalled,
        Self::ConsumedInProcessing,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PendingCertification => "PENDING_CERTIFICATION",
            Self::Certified => "CERTIFIED",
            Self::CertificationRejected => "CERTIFICATION_REJECTED",
            Self::Processed => "PROCESSED",
            Self::Distributed => "DISTRIBUTED",
            Self::Delivered => "DELIVERED",
            Self::Consumed => "CONSUMED",
            Self::Recalled => "RECALLED",
            Self::ConsumedInProcessing => "CONSUMED_IN_PROCESSING",
        }
    }

    /// Consumed either at retail or in processing.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Consumed | Self::ConsumedInProcessing)
    }

    /// May be spent as a transformation input.
    #[must_use]
    pub fn is_consumable(&self) -> bool {
        matches!(self, Self::Delivered | Self::Processed | Self::Certified)
    }

    /// A certifier has already decided.
    #[must_use]
    pub fn is_certification_decided(&self) -> bool {
        matches!(self, Self::Certified | Self::CertificationRejected)
    }

    /// Past the point where certification makes sense.
    #[must_use]
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::Distributed | Self::Delivered | Self::Consumed)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ContractError::validation("status", format!("invalid status '{s}'")))
    }
}

/// Outcome recorded in a certification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationStatus {
    /// Inspection in progress.
    Pending,
    /// Inspection passed.
    Approved,
    /// Inspection failed.
    Rejected,
}

impl CertificationStatus {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Approved or rejected.
    #[must_use]
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Overall shipment status after recording this outcome.
    #[must_use]
    pub fn resulting_status(&self) -> ShipmentStatus {
        match self {
            Self::Pending => ShipmentStatus::PendingCertification,
            Self::Approved => ShipmentStatus::Certified,
            Self::Rejected => ShipmentStatus::CertificationRejected,
        }
    }
}

impl fmt::Display for CertificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificationStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(ContractError::validation(
                "certificationStatus",
                format!("invalid value '{s}', must be one of: APPROVED, REJECTED, PENDING"),
            )),
        }
    }
}
