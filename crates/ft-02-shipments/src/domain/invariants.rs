//! Status/payload consistency, checked before every shipment write.
//!
//! | Status | Must carry |
//! |--------|------------|
//! | every | origin payload: `farmerData` (raw) or `processorData` + inputs (derived) |
//! | `CERTIFIED`, `CERTIFICATION_REJECTED` | at least one certification record |
//! | `PROCESSED` | `processorData` |
//! | `DISTRIBUTED` | `processorData`, `distributorData` |
//! | `DELIVERED`, `CONSUMED` | `distributorData`, `retailerData` |
//! | `RECALLED` | recall flag and recall id |
//! | `CONSUMED_IN_PROCESSING` | zero quantity |

use shared_types::ContractError;

use super::entities::{Shipment, SHIPMENT_OBJECT_TYPE};
use super::status::ShipmentStatus;

fn violation(shipment: &Shipment, detail: &str) -> ContractError {
    ContractError::InvariantViolation(format!(
        "shipment '{}' in status {}: {detail}",
        shipment.id, shipment.status
    ))
}

/// Reject a record whose status and populated payloads disagree.
pub fn check_stage_consistency(shipment: &Shipment) -> Result<(), ContractError> {
    use ShipmentStatus::*;

    if shipment.object_type != SHIPMENT_OBJECT_TYPE {
        return Err(violation(shipment, "wrong object type"));
    }

    if shipment.is_derived_product {
        if shipment.input_shipment_ids.is_empty() {
            return Err(violation(shipment, "derived product without inputs"));
        }
        if shipment.processor_data.is_none() {
            return Err(violation(shipment, "derived product without processorData"));
        }
    } else {
        if shipment.farmer_data.is_none() {
            return Err(violation(shipment, "farmerData missing"));
        }
        if !shipment.input_shipment_ids.is_empty() {
            return Err(violation(shipment, "inputs recorded on a non-derived shipment"));
        }
    }

    if shipment.status == ConsumedInProcessing {
        if shipment.quantity != 0.0 {
            return Err(violation(shipment, "consumed input with non-zero quantity"));
        }
    } else if shipment.quantity.is_nan() || shipment.quantity <= 0.0 {
        return Err(violation(shipment, "quantity must be positive"));
    }

    let recalled_status = shipment.status == Recalled;
    if recalled_status != shipment.recall_info.is_recalled {
        return Err(violation(shipment, "recall flag disagrees with status"));
    }

    match shipment.status {
        Certified | CertificationRejected if shipment.certification_records.is_empty() => {
            Err(violation(shipment, "certification decided without a record"))
        }
        Processed if shipment.processor_data.is_none() => {
            Err(violation(shipment, "processorData missing"))
        }
        Distributed if shipment.processor_data.is_none() || shipment.distributor_data.is_none() => {
            Err(violation(shipment, "processorData and distributorData required"))
        }
        Delivered | Consumed
            if shipment.distributor_data.is_none() || shipment.retailer_data.is_none() =>
        {
            Err(violation(shipment, "distributorData and retailerData required"))
        }
        Recalled if shipment.recall_info.recall_id.is_empty() => {
            Err(violation(shipment, "recall id missing"))
        }
        _ => Ok(()),
    }
}
