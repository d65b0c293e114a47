//! # Lifecycle Operations
//!
//! One transition per call. Each follows the same shape:
//!
//! ```text
//! role check → payload validation → load → recall/archive gate
//!     → status gate → ownership/designation → mutate → save → event
//! ```
//!
//! The designation check (`require_designated_recipient`) is never bypassed
//! by admin status; the role check is.

use ft_01_identity::{Designation, Requirement, Role};
use serde_json::json;
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::{info, warn};

use crate::contract::FoodtraceContract;
use crate::domain::{
    CertificationRecord, RecallInfo, Shipment, ShipmentStatus, SHIPMENT_OBJECT_TYPE,
};
use crate::events::{emit, ShipmentEventKind};
use crate::ports::LifecycleApi;
use crate::validation::{
    CertificationInput, DistributorDataInput, FarmerDataInput, InputConsumption, NewProduct,
    NewShipment, ProcessorDataInput, RetailerDataInput, SensorLogInput,
};

/// Fail when a shipment is recalled; recall freezes every transition.
pub(crate) fn ensure_not_recalled(shipment: &Shipment, operation: &str) -> Result<(), ContractError> {
    if shipment.is_recalled() {
        warn!(shipment_id = %shipment.id, operation, "Operation on recalled shipment rejected");
        return Err(ContractError::state(
            &shipment.id,
            shipment.status.as_str(),
            format!(
                "recalled under '{}'; {operation} is not allowed",
                shipment.recall_info.recall_id
            ),
        ));
    }
    Ok(())
}

/// Fail when a shipment is archived.
pub(crate) fn ensure_not_archived(shipment: &Shipment, operation: &str) -> Result<(), ContractError> {
    if shipment.is_archived {
        return Err(ContractError::state(
            &shipment.id,
            shipment.status.as_str(),
            format!("archived; unarchive before {operation}"),
        ));
    }
    Ok(())
}

impl FoodtraceContract {
    pub(crate) fn load_mutable(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        operation: &str,
    ) -> Result<Shipment, ContractError> {
        let shipment = self.store(ctx).require(shipment_id)?;
        ensure_not_recalled(&shipment, operation)?;
        ensure_not_archived(&shipment, operation)?;
        Ok(shipment)
    }

    pub(crate) fn expect_status(
        shipment: &Shipment,
        allowed: &[ShipmentStatus],
        operation: &str,
    ) -> Result<(), ContractError> {
        if allowed.contains(&shipment.status) {
            return Ok(());
        }
        let expected = allowed
            .iter()
            .map(ShipmentStatus::as_str)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(ContractError::state(
            &shipment.id,
            shipment.status.as_str(),
            format!("{operation} requires status {expected}"),
        ))
    }
}

impl LifecycleApi for FoodtraceContract {
    fn create_shipment(
        &self,
        ctx: &TxContext<'_>,
        input: &NewShipment,
        farmer_input: &FarmerDataInput,
    ) -> Result<Shipment, ContractError> {
        self.auth().require_role(ctx, Role::Farmer)?;
        let now = ctx.tx_timestamp();
        let validator = self.validator();
        validator.new_shipment(input)?;
        let mut farmer_data = validator.farmer_data(farmer_input, now)?;

        let store = self.store(ctx);
        let shipment_id = input.shipment_id.trim();
        if store.exists(shipment_id)? {
            warn!(shipment_id = %shipment_id, "Duplicate shipment id rejected");
            return Err(ContractError::Conflict(format!(
                "shipment '{shipment_id}' already exists"
            )));
        }

        let (processor_id, _) = self.resolve_party(ctx, &farmer_data.destination_processor_id)?;
        let actor = self.actor(ctx)?;
        farmer_data.farmer_id = actor.full_id.clone();
        farmer_data.farmer_alias = actor.alias.clone();
        farmer_data.destination_processor_id = processor_id.clone();

        let shipment = Shipment {
            object_type: SHIPMENT_OBJECT_TYPE.to_string(),
            id: shipment_id.to_string(),
            product_name: input.product_name.clone(),
            description: input.description.clone(),
            quantity: input.quantity,
            unit_of_measure: input.unit_of_measure.clone(),
            current_owner_id: actor.full_id.clone(),
            current_owner_alias: actor.alias.clone(),
            status: ShipmentStatus::Created,
            created_at: now,
            last_updated_at: now,
            is_archived: false,
            is_derived_product: false,
            input_shipment_ids: Vec::new(),
            farmer_data: Some(farmer_data),
            certification_records: Vec::new(),
            processor_data: None,
            distributor_data: None,
            retailer_data: None,
            recall_info: RecallInfo::default(),
            sensor_logs: Vec::new(),
        };
        store.save(&shipment)?;

        let crop = shipment
            .farmer_data
            .as_ref()
            .map(|f| f.crop_type.clone())
            .unwrap_or_default();
        emit(
            ctx,
            ShipmentEventKind::Created,
            &shipment,
            &actor,
            json!({ "destinationProcessorId": processor_id, "cropType": crop }),
        )?;
        info!(shipment_id = %shipment.id, farmer = %actor.alias, "Shipment created");
        Ok(shipment)
    }

    fn submit_for_certification(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "submit for certification";
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;
        self.auth().require(
            ctx,
            &Requirement::OwnerOrAdmin {
                owner_id: &shipment.current_owner_id,
            },
        )?;

        let status = shipment.status;
        if status == ShipmentStatus::PendingCertification {
            return Err(ContractError::Conflict(format!(
                "shipment '{shipment_id}' is already pending certification"
            )));
        }
        if status.is_certification_decided() {
            return Err(ContractError::state(
                shipment_id,
                status.as_str(),
                "certification has already been decided",
            ));
        }
        if status.is_downstream() || status.is_terminal() {
            return Err(ContractError::state(
                shipment_id,
                status.as_str(),
                "too far along the supply chain to be certified",
            ));
        }
        Self::expect_status(
            &shipment,
            &[ShipmentStatus::Created, ShipmentStatus::Processed],
            OP,
        )?;

        let actor = self.actor(ctx)?;
        shipment.status = ShipmentStatus::PendingCertification;
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::SubmittedForCertification,
            &shipment,
            &actor,
            json!({ "previousStatus": status.as_str() }),
        )?;
        info!(shipment_id = %shipment_id, by = %actor.alias, "Shipment submitted for certification");
        Ok(shipment)
    }

    fn record_certification(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        input: &CertificationInput,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "record certification";
        self.auth().require_role(ctx, Role::Certifier)?;
        let decision = self.validator().certification(input)?;
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;

        let status = shipment.status;
        if status.is_terminal() || status.is_downstream() {
            return Err(ContractError::state(
                shipment_id,
                status.as_str(),
                "certification cannot be recorded at this stage",
            ));
        }
        if decision.status.is_final() && status != ShipmentStatus::PendingCertification {
            if !self.auth().caller_is_admin(ctx)? {
                return Err(ContractError::state(
                    shipment_id,
                    status.as_str(),
                    format!(
                        "a final decision ({}) requires status PENDING_CERTIFICATION; only an administrator can override",
                        decision.status
                    ),
                ));
            }
            warn!(
                shipment_id = %shipment_id,
                status = %status,
                decision = %decision.status,
                admin = %ctx.caller_id(),
                "Administrator overriding certification status check"
            );
        }
        if decision.status.is_final() && decision.inspection_report_hash.trim().is_empty() {
            warn!(shipment_id = %shipment_id, "Final certification recorded without an inspection report hash");
        }

        let actor = self.actor(ctx)?;
        let now = ctx.tx_timestamp();
        shipment.certification_records.push(CertificationRecord {
            certifier_id: actor.full_id.clone(),
            certifier_alias: actor.alias.clone(),
            inspection_date: decision.inspection_date,
            inspection_report_hash: decision.inspection_report_hash.clone(),
            status: decision.status,
            comments: decision.comments.clone(),
            certified_at: now,
        });
        shipment.status = decision.status.resulting_status();
        shipment.last_updated_at = now;
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::CertificationRecorded,
            &shipment,
            &actor,
            json!({
                "certificationStatusRecord": decision.status.as_str(),
                "inspectionDate": decision.inspection_date.to_rfc3339(),
                "comments": decision.comments,
            }),
        )?;
        info!(
            shipment_id = %shipment_id,
            certifier = %actor.alias,
            status = %shipment.status,
            "Certification recorded"
        );
        Ok(shipment)
    }

    fn process_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        input: &ProcessorDataInput,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "process";
        self.auth().require_role(ctx, Role::Processor)?;
        let mut data = self.validator().processor_data(input)?;
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;
        Self::expect_status(
            &shipment,
            &[ShipmentStatus::Created, ShipmentStatus::Certified],
            OP,
        )?;

        if shipment.status == ShipmentStatus::Created {
            let designee = shipment
                .farmer_data
                .as_ref()
                .map(|f| f.destination_processor_id.as_str());
            self.auth().require_designated_recipient(
                ctx,
                &Designation {
                    shipment_id,
                    stage: shipment.status.as_str(),
                    designee,
                },
            )?;
        }

        let (distributor_id, _) = self.resolve_party(ctx, &data.destination_distributor_id)?;
        let actor = self.actor(ctx)?;
        data.processor_id = actor.full_id.clone();
        data.processor_alias = actor.alias.clone();
        data.destination_distributor_id = distributor_id.clone();
        let processing_type = data.processing_type.clone();

        shipment.processor_data = Some(data);
        shipment.status = ShipmentStatus::Processed;
        shipment.transfer_to(&actor.full_id, &actor.alias);
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::Processed,
            &shipment,
            &actor,
            json!({
                "destinationDistributorId": distributor_id,
                "processingType": processing_type,
            }),
        )?;
        info!(shipment_id = %shipment_id, processor = %actor.alias, "Shipment processed");
        Ok(shipment)
    }

    fn distribute_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        input: &DistributorDataInput,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "distribute";
        self.auth().require_role(ctx, Role::Distributor)?;
        let mut data = self.validator().distributor_data(input)?;
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;
        Self::expect_status(&shipment, &[ShipmentStatus::Processed], OP)?;

        let designee = shipment
            .processor_data
            .as_ref()
            .map(|p| p.destination_distributor_id.as_str());
        self.auth().require_designated_recipient(
            ctx,
            &Designation {
                shipment_id,
                stage: shipment.status.as_str(),
                designee,
            },
        )?;

        let (retailer_id, _) = self.resolve_party(ctx, &data.destination_retailer_id)?;
        let actor = self.actor(ctx)?;
        data.distributor_id = actor.full_id.clone();
        data.distributor_alias = actor.alias.clone();
        data.destination_retailer_id = retailer_id.clone();
        let pickup = data.pickup_date_time;

        shipment.distributor_data = Some(data);
        shipment.status = ShipmentStatus::Distributed;
        shipment.transfer_to(&actor.full_id, &actor.alias);
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::Distributed,
            &shipment,
            &actor,
            json!({
                "destinationRetailerId": retailer_id,
                "pickupDateTime": pickup.to_rfc3339(),
            }),
        )?;
        info!(shipment_id = %shipment_id, distributor = %actor.alias, "Shipment distributed");
        Ok(shipment)
    }

    fn receive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        input: &RetailerDataInput,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "receive";
        self.auth().require_role(ctx, Role::Retailer)?;
        let mut data = self.validator().retailer_data(input)?;
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;
        Self::expect_status(&shipment, &[ShipmentStatus::Distributed], OP)?;

        let designee = shipment
            .distributor_data
            .as_ref()
            .map(|d| d.destination_retailer_id.as_str());
        self.auth().require_designated_recipient(
            ctx,
            &Designation {
                shipment_id,
                stage: shipment.status.as_str(),
                designee,
            },
        )?;

        let actor = self.actor(ctx)?;
        data.retailer_id = actor.full_id.clone();
        data.retailer_alias = actor.alias.clone();
        let received = data.date_received;
        let store_location = data.store_location.clone();

        shipment.retailer_data = Some(data);
        shipment.status = ShipmentStatus::Delivered;
        shipment.transfer_to(&actor.full_id, &actor.alias);
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::Delivered,
            &shipment,
            &actor,
            json!({
                "dateReceived": received.to_rfc3339(),
                "storeLocation": store_location,
            }),
        )?;
        info!(shipment_id = %shipment_id, retailer = %actor.alias, "Shipment delivered");
        Ok(shipment)
    }

    fn mark_consumed(&self, ctx: &TxContext<'_>, shipment_id: &str) -> Result<Shipment, ContractError> {
        const OP: &str = "mark consumed";
        self.auth().require_role(ctx, Role::Retailer)?;
        let mut shipment = self.load_mutable(ctx, shipment_id, OP)?;
        self.auth().require(
            ctx,
            &Requirement::OwnerOrAdmin {
                owner_id: &shipment.current_owner_id,
            },
        )?;
        Self::expect_status(&shipment, &[ShipmentStatus::Delivered], OP)?;

        let actor = self.actor(ctx)?;
        shipment.status = ShipmentStatus::Consumed;
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(ctx, ShipmentEventKind::Consumed, &shipment, &actor, json!({}))?;
        info!(shipment_id = %shipment_id, by = %actor.alias, "Shipment consumed");
        Ok(shipment)
    }

    fn archive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        reason: &str,
    ) -> Result<Shipment, ContractError> {
        self.auth().require_admin(ctx)?;
        self.validator()
            .optional(reason, "archiveReason", self.config().max_description_length)?;
        let mut shipment = self.store(ctx).require(shipment_id)?;
        ensure_not_recalled(&shipment, "archive")?;
        if shipment.is_archived {
            info!(shipment_id = %shipment_id, "Shipment already archived");
            return Ok(shipment);
        }

        let actor = self.actor(ctx)?;
        shipment.is_archived = true;
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::Archived,
            &shipment,
            &actor,
            json!({ "archiveReason": reason }),
        )?;
        info!(shipment_id = %shipment_id, admin = %actor.alias, "Shipment archived");
        Ok(shipment)
    }

    fn unarchive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Shipment, ContractError> {
        self.auth().require_admin(ctx)?;
        let mut shipment = self.store(ctx).require(shipment_id)?;
        ensure_not_recalled(&shipment, "unarchive")?;
        if !shipment.is_archived {
            info!(shipment_id = %shipment_id, "Shipment is not archived");
            return Ok(shipment);
        }

        let actor = self.actor(ctx)?;
        shipment.is_archived = false;
        shipment.last_updated_at = ctx.tx_timestamp();
        self.store(ctx).save(&shipment)?;
        emit(ctx, ShipmentEventKind::Unarchived, &shipment, &actor, json!({}))?;
        info!(shipment_id = %shipment_id, admin = %actor.alias, "Shipment unarchived");
        Ok(shipment)
    }

    fn transform_and_create_products(
        &self,
        ctx: &TxContext<'_>,
        inputs: &[InputConsumption],
        outputs: &[NewProduct],
        processor_data: &ProcessorDataInput,
    ) -> Result<Vec<Shipment>, ContractError> {
        self.transform(ctx, inputs, outputs, processor_data)
    }

    fn add_sensor_log(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        reading: &SensorLogInput,
    ) -> Result<Shipment, ContractError> {
        self.append_sensor_log(ctx, shipment_id, reading)
    }
}
