//! # Error Types
//!
//! Defines the error taxonomy shared by the ledger, identity and shipment crates.

use thiserror::Error;

use crate::entities::EntityKind;

/// Errors raised by the ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A lock guarding ledger state was poisoned by a panicking writer.
    #[error("Ledger lock poisoned")]
    LockPoisoned,

    /// The ledger backend cannot evaluate attribute selectors.
    #[error("Rich queries are not supported by this ledger")]
    RichQueryUnsupported,

    /// A continuation bookmark could not be decoded.
    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    /// A composite key component contained a reserved character.
    #[error("Invalid composite key component: {0}")]
    InvalidCompositeKey(String),

    /// The backend refused a write.
    #[error("Write rejected for key {key}")]
    WriteRejected { key: String },

    /// A key read by the transaction changed before it committed.
    #[error("MVCC read conflict on key {key}")]
    MvccConflict { key: String },

    /// The transaction was already committed.
    #[error("Transaction already closed")]
    TransactionClosed,

    /// Stored bytes could not be encoded or decoded.
    #[error("Ledger serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// True when resubmitting the same transaction may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MvccConflict { .. })
    }
}

/// Errors related to envelope verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Message version not supported.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// The envelope did not carry a caller identity.
    #[error("Missing caller identity")]
    MissingCaller,
}

/// Errors returned by contract operations.
///
/// Every variant carries enough context (shipment id, expected vs. actual
/// status, designated vs. actual actor) to diagnose without ledger access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Malformed, missing or out-of-range input. Always the caller's fault.
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Unknown shipment, identity or alias.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Role, ownership or designation failure.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Duplicate id, already-in-target-state or already-linked.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wrong current status for the requested operation.
    #[error("Invalid state for shipment '{shipment_id}' (status {status}): {reason}")]
    StateTransition {
        shipment_id: String,
        status: String,
        reason: String,
    },

    /// The previous stage never nominated a next actor.
    #[error("Shipment '{shipment_id}' does not declare a designated recipient for stage {stage}")]
    MissingDesignation { shipment_id: String, stage: String },

    /// A record about to be written breaks the status/payload invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A multi-write invariant broke and the rollback also failed.
    #[error("CRITICAL consistency failure on {key}: {detail}")]
    ConsistencyFatal { key: String, detail: String },

    /// Ledger collaborator failure.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Payload encoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ContractError {
    /// Shorthand for a [`ContractError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ContractError::NotFound`].
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for a [`ContractError::StateTransition`].
    pub fn state(
        shipment_id: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StateTransition {
            shipment_id: shipment_id.into(),
            status: status.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input or permissions.
    #[must_use]
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Unauthorized(_)
                | Self::Conflict(_)
                | Self::StateTransition { .. }
                | Self::MissingDesignation { .. }
        )
    }

    /// True for errors that must be escalated to an operator.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConsistencyFatal { .. })
    }

    /// Stable numeric code for gateway responses.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Validation { .. } => -32010,
            Self::NotFound { .. } => -32011,
            Self::Unauthorized(_) => -32012,
            Self::Conflict(_) => -32013,
            Self::StateTransition { .. } => -32014,
            Self::MissingDesignation { .. } => -32015,
            Self::InvariantViolation(_) => -32020,
            Self::ConsistencyFatal { .. } => -32021,
            Self::Ledger(_) => -32030,
            Self::Serialization(_) => -32031,
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
