//! # `AuthenticatedMessage` Envelope
//!
//! The universal wrapper for every contract invocation.
//!
//! ## Security Properties
//!
//! - **Versioning**: All messages include a `version` field for forward compatibility.
//! - **Correlation**: Each invocation carries a `correlation_id` echoed in logs and responses.
//! - **Envelope Authority**: The `caller` is the sole source of truth for identity.
//!   It is assigned by the trust infrastructure, never by the payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::CallerIdentity;
use crate::errors::MessageError;

/// The universal message envelope for contract invocations.
///
/// - The `caller` is the ONLY source of truth for the invoker's identity.
/// - Payloads MUST NOT carry redundant identity fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedMessage<T> {
    // =========================================================================
    // HEADER SECTION
    // =========================================================================
    /// Protocol version for forward compatibility.
    /// MUST be checked before processing.
    pub version: u16,

    /// The verified caller. Unforgeable by construction: populated by the
    /// identity-assertion layer, not by the client payload.
    pub caller: CallerIdentity,

    /// Unique identifier for correlating an invocation with its response.
    pub correlation_id: Uuid,

    /// Unix timestamp (seconds) when the client built the invocation.
    /// Informational only; the ledger's transaction timestamp is authoritative.
    pub timestamp: u64,

    /// Client nonce, folded into the transaction id.
    pub nonce: Uuid,

    // =========================================================================
    // PAYLOAD SECTION
    // =========================================================================
    /// The actual invocation payload (generic over message type).
    pub payload: T,
}

impl<T> AuthenticatedMessage<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wrap a payload for the given caller with a fresh correlation id and nonce.
    pub fn new(caller: CallerIdentity, payload: T) -> Self {
        let timestamp = chrono::Utc::now().timestamp().max(0).unsigned_abs();
        Self {
            version: Self::CURRENT_VERSION,
            caller,
            correlation_id: Uuid::new_v4(),
            timestamp,
            nonce: Uuid::new_v4(),
            payload,
        }
    }

    /// Check the envelope header before the payload is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError`] for an unsupported version or an empty caller id.
    pub fn verify_header(&self) -> Result<(), MessageError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(MessageError::UnsupportedVersion {
                received: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }
        if self.caller.full_id.trim().is_empty() {
            return Err(MessageError::MissingCaller);
        }
        Ok(())
    }
}
