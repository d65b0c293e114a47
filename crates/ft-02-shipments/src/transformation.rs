//! # Transformation
//!
//! Spends input shipments to create derived products in two phases:
//!
//! 1. **Validate**: every argument, every input and every output id is checked
//!    and nothing is written.
//! 2. **Apply**: inputs are claimed by the processor and zeroed, outputs are
//!    created with lineage back to all inputs.
//!
//! A failure in phase 1 leaves the ledger untouched. A failure in phase 2
//! propagates and the enclosing transaction is discarded, so no partial
//! lineage is ever committed.

use std::collections::HashSet;

use ft_01_identity::Role;
use serde_json::json;
use shared_ledger::TxContext;
use shared_types::{ContractError, EntityKind};
use tracing::{info, warn};

use crate::contract::FoodtraceContract;
use crate::domain::{RecallInfo, Shipment, ShipmentStatus, SHIPMENT_OBJECT_TYPE};
use crate::events::{emit, ShipmentEventKind};
use crate::validation::{InputConsumption, NewProduct, ProcessorDataInput};

impl FoodtraceContract {
    pub(crate) fn transform(
        &self,
        ctx: &TxContext<'_>,
        inputs: &[InputConsumption],
        outputs: &[NewProduct],
        processor_input: &ProcessorDataInput,
    ) -> Result<Vec<Shipment>, ContractError> {
        self.auth().require_role(ctx, Role::Processor)?;
        let validator = self.validator();

        if inputs.is_empty() {
            return Err(ContractError::validation("inputShipments", "cannot be empty"));
        }
        if outputs.is_empty() {
            return Err(ContractError::validation("newProducts", "cannot be empty"));
        }
        validator.list_len(inputs.len(), "inputShipments")?;
        validator.list_len(outputs.len(), "newProducts")?;
        let mut data = validator.processor_data(processor_input)?;

        // Phase 1: validate everything
        let store = self.store(ctx);
        let mut input_ids = Vec::with_capacity(inputs.len());
        let mut seen = HashSet::new();
        for (i, input) in inputs.iter().enumerate() {
            let id = input.shipment_id.trim();
            validator.text(id, &format!("inputShipments[{i}].shipmentId"))?;
            if !seen.insert(id.to_string()) {
                return Err(ContractError::validation(
                    format!("inputShipments[{i}].shipmentId"),
                    format!("duplicate input shipment '{id}'"),
                ));
            }
            input_ids.push(id.to_string());
        }

        let mut output_ids = HashSet::new();
        for (i, product) in outputs.iter().enumerate() {
            validator.new_product(product, i)?;
            let id = product.new_shipment_id.trim();
            if !output_ids.insert(id.to_string()) {
                return Err(ContractError::validation(
                    format!("newProducts[{i}].newShipmentId"),
                    format!("duplicate output shipment '{id}'"),
                ));
            }
            if seen.contains(id) {
                return Err(ContractError::validation(
                    format!("newProducts[{i}].newShipmentId"),
                    format!("'{id}' is also listed as an input"),
                ));
            }
            if store.exists(id)? {
                return Err(ContractError::Conflict(format!(
                    "output shipment '{id}' already exists"
                )));
            }
        }

        let mut loaded = Vec::with_capacity(input_ids.len());
        for id in &input_ids {
            let shipment = store
                .load(id)?
                .ok_or_else(|| ContractError::not_found(EntityKind::Shipment, id.as_str()))?;
            Self::check_consumable(&shipment)?;
            loaded.push(shipment);
        }

        let (distributor_id, _) = self.resolve_party(ctx, &data.destination_distributor_id)?;
        let actor = self.actor(ctx)?;
        data.processor_id = actor.full_id.clone();
        data.processor_alias = actor.alias.clone();
        data.destination_distributor_id = distributor_id;
        let now = ctx.tx_timestamp();

        // Phase 2: apply
        for mut input in loaded {
            let previous_owner = input.current_owner_id.clone();
            let previous_quantity = input.quantity;
            if previous_owner != actor.full_id {
                info!(
                    shipment_id = %input.id,
                    from = %previous_owner,
                    to = %actor.full_id,
                    "Processor claiming input shipment"
                );
                input.transfer_to(&actor.full_id, &actor.alias);
            }
            input.status = ShipmentStatus::ConsumedInProcessing;
            input.quantity = 0.0;
            input.last_updated_at = now;
            store.save(&input)?;
            emit(
                ctx,
                ShipmentEventKind::InputConsumedInTransformation,
                &input,
                &actor,
                json!({
                    "previousOwnerId": previous_owner,
                    "consumedQuantity": previous_quantity,
                }),
            )?;
        }

        let mut created = Vec::with_capacity(outputs.len());
        for product in outputs {
            let output = Shipment {
                object_type: SHIPMENT_OBJECT_TYPE.to_string(),
                id: product.new_shipment_id.trim().to_string(),
                product_name: product.product_name.clone(),
                description: product.description.clone(),
                quantity: product.quantity,
                unit_of_measure: product.unit_of_measure.clone(),
                current_owner_id: actor.full_id.clone(),
                current_owner_alias: actor.alias.clone(),
                status: ShipmentStatus::Processed,
                created_at: now,
                last_updated_at: now,
                is_archived: false,
                is_derived_product: true,
                input_shipment_ids: input_ids.clone(),
                farmer_data: None,
                certification_records: Vec::new(),
                processor_data: Some(data.clone()),
                distributor_data: None,
                retailer_data: None,
                recall_info: RecallInfo::default(),
                sensor_logs: Vec::new(),
            };
            store.save(&output)?;
            emit(
                ctx,
                ShipmentEventKind::DerivedProductCreated,
                &output,
                &actor,
                json!({ "inputShipmentIds": input_ids }),
            )?;
            created.push(output);
        }

        info!(
            processor = %actor.alias,
            inputs = input_ids.len(),
            outputs = created.len(),
            "Transformation applied"
        );
        Ok(created)
    }

    fn check_consumable(shipment: &Shipment) -> Result<(), ContractError> {
        let reason = if shipment.is_recalled() {
            Some("input is recalled")
        } else if shipment.is_archived {
            Some("input is archived")
        } else if shipment.status.is_terminal() {
            Some("input has already been consumed")
        } else if !shipment.status.is_consumable() {
            Some("input must be DELIVERED, PROCESSED or CERTIFIED")
        } else {
            None
        };
        match reason {
            Some(reason) => {
                warn!(shipment_id = %shipment.id, status = %shipment.status, reason, "Transformation input rejected");
                Err(ContractError::state(
                    &shipment.id,
                    shipment.status.as_str(),
                    reason,
                ))
            }
            None => Ok(()),
        }
    }
}
