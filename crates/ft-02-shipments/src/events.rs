//! Shipment events attached to the running transaction.
//!
//! Every payload carries the same base fields so bus consumers can route on
//! `shipmentId`, `status` and `actorFullId` without knowing the event.

use serde_json::{json, Value};
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::debug;

use crate::contract::Actor;
use crate::domain::Shipment;

/// Events emitted by shipment operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentEventKind {
    Created,
    SubmittedForCertification,
    CertificationRecorded,
    Processed,
    Distributed,
    Delivered,
    Consumed,
    InputConsumedInTransformation,
    DerivedProductCreated,
    Recalled,
    LinkedToRecall,
    SensorLogAdded,
    Archived,
    Unarchived,
}

impl ShipmentEventKind {
    /// Event name on the ledger.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "ShipmentCreated",
            Self::SubmittedForCertification => "ShipmentSubmittedForCertification",
            Self::CertificationRecorded => "ShipmentCertificationRecorded",
            Self::Processed => "ShipmentProcessed",
            Self::Distributed => "ShipmentDistributed",
            Self::Delivered => "ShipmentDelivered",
            Self::Consumed => "ShipmentConsumed",
            Self::InputConsumedInTransformation => "InputShipmentConsumedInTransformation",
            Self::DerivedProductCreated => "DerivedProductCreated",
            Self::Recalled => "ShipmentRecalled",
            Self::LinkedToRecall => "ShipmentLinkedToRecall",
            Self::SensorLogAdded => "DistributorSensorLogAdded",
            Self::Archived => "ShipmentArchived",
            Self::Unarchived => "ShipmentUnarchived",
        }
    }
}

/// Attach a shipment event. `extra` fields are merged over the base payload.
pub(crate) fn emit(
    ctx: &TxContext<'_>,
    kind: ShipmentEventKind,
    shipment: &Shipment,
    actor: &Actor,
    extra: Value,
) -> Result<(), ContractError> {
    let mut payload = json!({
        "shipmentId": shipment.id,
        "productName": shipment.product_name,
        "status": shipment.status.as_str(),
        "currentOwnerId": shipment.current_owner_id,
        "currentOwnerAlias": shipment.current_owner_alias,
        "actorFullId": actor.full_id,
        "actorAlias": actor.alias,
        "transactionTimestamp": ctx.tx_timestamp().to_rfc3339(),
    });
    if let (Some(base), Value::Object(more)) = (payload.as_object_mut(), extra) {
        base.extend(more);
    }
    ctx.stub()
        .set_event(kind.name(), serde_json::to_vec(&payload)?)?;
    debug!(event = kind.name(), shipment_id = %shipment.id, "Shipment event emitted");
    Ok(())
}
