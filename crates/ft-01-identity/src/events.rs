//! Identity events attached to the running transaction.

use serde_json::{json, Value};
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::debug;

/// Events emitted by directory mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityEventKind {
    /// New identity or alias/enrollment update.
    Registered,
    /// Role granted.
    RoleAssigned,
    /// Role revoked.
    RoleRemoved,
    /// Admin flag set.
    AdminGranted,
    /// Admin flag cleared.
    AdminRevoked,
    /// First administrator created through the bootstrap path.
    LedgerBootstrapped,
}

impl IdentityEventKind {
    /// Event name on the ledger.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered => "IdentityRegistered",
            Self::RoleAssigned => "RoleAssigned",
            Self::RoleRemoved => "RoleRemoved",
            Self::AdminGranted => "AdminGranted",
            Self::AdminRevoked => "AdminRevoked",
            Self::LedgerBootstrapped => "LedgerBootstrapped",
        }
    }
}

/// Attach an identity event. `extra` fields are merged over the base payload.
pub(crate) fn emit(
    ctx: &TxContext<'_>,
    kind: IdentityEventKind,
    target_full_id: &str,
    extra: Value,
) -> Result<(), ContractError> {
    let mut payload = json!({
        "targetFullId": target_full_id,
        "actorFullId": ctx.caller_id(),
        "transactionTimestamp": ctx.tx_timestamp().to_rfc3339(),
    });
    if let (Some(base), Value::Object(more)) = (payload.as_object_mut(), extra) {
        base.extend(more);
    }
    ctx.stub()
        .set_event(kind.name(), serde_json::to_vec(&payload)?)?;
    debug!(event = kind.name(), target = %target_full_id, "Identity event emitted");
    Ok(())
}
