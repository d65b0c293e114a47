//! # Recall Engine
//!
//! | Operation | Access | Atomicity |
//! |-----------|--------|-----------|
//! | `initiate_recall` | owner or admin | all or nothing |
//! | `add_linked_shipments` | recall initiator or admin | best effort per item |
//! | `query_related_shipments` | admin | read-only |
//!
//! Relatedness is decided by the first matching rule:
//!
//! 1. same processor and processing line, `|Δ dateProcessed| ≤ window`
//! 2. same distributor and distribution line, `|Δ pickupDateTime| ≤ window`
//! 3. same farmer and farm location, `|Δ harvestDate| ≤ window`

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use ft_01_identity::Requirement;
use serde_json::json;
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::{info, warn};

use crate::contract::FoodtraceContract;
use crate::domain::{LinkReport, RelatedShipment, Shipment, ShipmentStatus};
use crate::events::{emit, ShipmentEventKind};
use crate::ports::RecallApi;

const SAME_PROCESSING_LINE: &str = "Same processing line within time window";
const SAME_DISTRIBUTION_LINE: &str = "Same distribution line within time window";
const SAME_FARM_HARVEST: &str = "Same farm and harvest period";

fn within(a: DateTime<Utc>, b: DateTime<Utc>, window: Duration) -> bool {
    (a - b).num_seconds().abs() <= window.num_seconds()
}

/// First rule under which `candidate` relates to `recalled`.
fn relation(recalled: &Shipment, candidate: &Shipment, window: Duration) -> Option<RelatedShipment> {
    let related = |reason: &str, actor_id: &str, actor_alias: &str, line_id: &str, at| {
        Some(RelatedShipment {
            shipment_id: candidate.id.clone(),
            product_name: candidate.product_name.clone(),
            status: candidate.status,
            current_owner_id: candidate.current_owner_id.clone(),
            current_owner_alias: candidate.current_owner_alias.clone(),
            relation_reason: reason.to_string(),
            actor_id: actor_id.to_string(),
            actor_alias: actor_alias.to_string(),
            line_id: line_id.to_string(),
            event_timestamp: Some(at),
        })
    };

    if let (Some(r), Some(c)) = (&recalled.processor_data, &candidate.processor_data) {
        if !r.processor_id.is_empty()
            && !r.processing_line_id.is_empty()
            && r.processor_id == c.processor_id
            && r.processing_line_id == c.processing_line_id
            && within(r.date_processed, c.date_processed, window)
        {
            return related(
                SAME_PROCESSING_LINE,
                &c.processor_id,
                &c.processor_alias,
                &c.processing_line_id,
                c.date_processed,
            );
        }
    }
    if let (Some(r), Some(c)) = (&recalled.distributor_data, &candidate.distributor_data) {
        if !r.distributor_id.is_empty()
            && !r.distribution_line_id.is_empty()
            && r.distributor_id == c.distributor_id
            && r.distribution_line_id == c.distribution_line_id
            && within(r.pickup_date_time, c.pickup_date_time, window)
        {
            return related(
                SAME_DISTRIBUTION_LINE,
                &c.distributor_id,
                &c.distributor_alias,
                &c.distribution_line_id,
                c.pickup_date_time,
            );
        }
    }
    if let (Some(r), Some(c)) = (&recalled.farmer_data, &candidate.farmer_data) {
        if !r.farmer_id.is_empty()
            && !r.farm_location.is_empty()
            && r.farmer_id == c.farmer_id
            && r.farm_location == c.farm_location
            && within(r.harvest_date, c.harvest_date, window)
        {
            return related(SAME_FARM_HARVEST, &c.farmer_id, &c.farmer_alias, "", c.harvest_date);
        }
    }
    None
}

impl RecallApi for FoodtraceContract {
    fn initiate_recall(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        recall_id: &str,
        reason: &str,
    ) -> Result<Shipment, ContractError> {
        let validator = self.validator();
        validator.text(recall_id, "recallId")?;
        validator.required(reason, "reason", self.config().max_recall_reason_length)?;
        let mut shipment = self.store(ctx).require(shipment_id)?;
        self.auth().require(
            ctx,
            &Requirement::OwnerOrAdmin {
                owner_id: &shipment.current_owner_id,
            },
        )?;

        if shipment.recall_info.is_under(recall_id) {
            return Err(ContractError::Conflict(format!(
                "shipment '{shipment_id}' is already part of recall '{recall_id}'"
            )));
        }
        if shipment.status.is_terminal() {
            return Err(ContractError::state(
                shipment_id,
                shipment.status.as_str(),
                "consumed shipments cannot be recalled",
            ));
        }
        if shipment.is_recalled() {
            warn!(
                shipment_id = %shipment_id,
                previous = %shipment.recall_info.recall_id,
                recall_id = %recall_id,
                "Shipment already recalled; recording new recall event"
            );
        }

        let actor = self.actor(ctx)?;
        let now = ctx.tx_timestamp();
        let info = &mut shipment.recall_info;
        info.is_recalled = true;
        info.recall_id = recall_id.to_string();
        info.recall_reason = reason.to_string();
        info.recall_date = Some(now);
        info.recalled_by = actor.full_id.clone();
        info.recalled_by_alias = actor.alias.clone();
        shipment.status = ShipmentStatus::Recalled;
        shipment.last_updated_at = now;
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::Recalled,
            &shipment,
            &actor,
            json!({ "recallId": recall_id, "reason": reason }),
        )?;
        info!(shipment_id = %shipment_id, recall_id = %recall_id, by = %actor.alias, "Shipment recalled");
        Ok(shipment)
    }

    fn add_linked_shipments(
        &self,
        ctx: &TxContext<'_>,
        recall_id: &str,
        primary_shipment_id: &str,
        linked_ids: &[String],
    ) -> Result<LinkReport, ContractError> {
        let validator = self.validator();
        validator.text(recall_id, "recallId")?;
        let store = self.store(ctx);
        let mut primary = store.require(primary_shipment_id)?;
        self.auth().require(
            ctx,
            &Requirement::ActorOrAdmin {
                actor_id: &primary.recall_info.recalled_by,
            },
        )?;
        if !primary.recall_info.is_under(recall_id) {
            return Err(ContractError::state(
                primary_shipment_id,
                primary.status.as_str(),
                format!("not recalled under '{recall_id}'"),
            ));
        }

        let mut report = LinkReport::default();
        if linked_ids.is_empty() {
            info!(recall_id = %recall_id, "No shipments to link");
            return Ok(report);
        }
        validator.list_len(linked_ids.len(), "linkedShipmentIds")?;

        let actor = self.actor(ctx)?;
        let now = ctx.tx_timestamp();
        let mut requested = HashSet::new();
        for raw_id in linked_ids {
            let id = raw_id.trim();
            if let Err(e) = validator.text(id, "linkedShipmentId") {
                warn!(shipment_id = %raw_id, error = %e, "Skipping invalid linked shipment id");
                report.skip(raw_id, format!("invalid id: {e}"));
                continue;
            }
            if id == primary_shipment_id {
                report.skip(id, "cannot link the primary shipment to itself");
                continue;
            }
            if !requested.insert(id) {
                report.skip(id, "duplicate in request");
                continue;
            }
            let mut linked = match store.load(id) {
                Ok(Some(s)) => s,
                Ok(None) => {
                    warn!(shipment_id = %id, "Skipping unknown linked shipment");
                    report.skip(id, "not found");
                    continue;
                }
                Err(e) => {
                    warn!(shipment_id = %id, error = %e, "Skipping unreadable linked shipment");
                    report.skip(id, format!("could not be loaded: {e}"));
                    continue;
                }
            };
            if linked.recall_info.is_under(recall_id) {
                report.skip(id, format!("already linked to recall '{recall_id}'"));
                continue;
            }
            if linked.status.is_terminal() {
                report.skip(id, format!("status {} cannot be recalled", linked.status));
                continue;
            }
            if linked.is_recalled() {
                warn!(
                    shipment_id = %id,
                    previous = %linked.recall_info.recall_id,
                    recall_id = %recall_id,
                    "Linked shipment moves to a new recall"
                );
            }

            let unlinked = linked.clone();
            let source = &primary.recall_info;
            let info = &mut linked.recall_info;
            info.is_recalled = true;
            info.recall_id = recall_id.to_string();
            info.recall_reason = source.recall_reason.clone();
            info.recall_date = Some(now);
            info.recalled_by = source.recalled_by.clone();
            info.recalled_by_alias = source.recalled_by_alias.clone();
            linked.status = ShipmentStatus::Recalled;
            linked.last_updated_at = now;

            if let Err(e) = store.save(&linked) {
                warn!(shipment_id = %id, error = %e, "Skipping linked shipment that failed to save");
                report.skip(id, format!("save failed: {e}"));
                continue;
            }
            let emitted = emit(
                ctx,
                ShipmentEventKind::LinkedToRecall,
                &linked,
                &actor,
                json!({
                    "recallId": recall_id,
                    "reason": linked.recall_info.recall_reason,
                    "linkedToPrimaryShipment": primary_shipment_id,
                }),
            );
            if let Err(e) = emitted {
                warn!(shipment_id = %id, error = %e, "Skipping linked shipment whose event failed");
                store.save(&unlinked)?;
                report.skip(id, format!("event failed: {e}"));
                continue;
            }
            report.linked.push(id.to_string());
        }

        if !report.linked.is_empty() {
            let existing: HashSet<String> =
                primary.recall_info.linked_shipment_ids.iter().cloned().collect();
            let additions: Vec<String> = report
                .linked
                .iter()
                .filter(|id| !existing.contains(*id))
                .cloned()
                .collect();
            primary.recall_info.linked_shipment_ids.extend(additions);
            primary.last_updated_at = now;
            store.save(&primary)?;
        }

        info!(
            recall_id = %recall_id,
            primary = %primary_shipment_id,
            linked = report.linked.len(),
            skipped = report.skipped.len(),
            "Linked shipments to recall"
        );
        Ok(report)
    }

    fn query_related_shipments(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        window_hours: Option<i64>,
    ) -> Result<Vec<RelatedShipment>, ContractError> {
        self.auth().require_admin(ctx)?;
        let hours = self.config().recall_window_hours(window_hours);
        if window_hours != Some(hours) {
            warn!(requested = ?window_hours, using = hours, "Recall window defaulted or clamped");
        }
        let window = Duration::hours(hours);
        let store = self.store(ctx);
        let recalled = store.require(shipment_id)?;
        let recall_id = recalled
            .is_recalled()
            .then_some(recalled.recall_info.recall_id.as_str())
            .filter(|id| !id.is_empty());

        let mut related = Vec::new();
        for mut candidate in store.scan_all()? {
            if candidate.id == recalled.id {
                continue;
            }
            if recall_id.is_some_and(|id| candidate.recall_info.is_under(id)) {
                continue;
            }
            self.enrich_aliases(ctx, &mut candidate);
            if let Some(found) = relation(&recalled, &candidate, window) {
                related.push(found);
            }
        }
        info!(shipment_id = %shipment_id, window_hours = hours, found = related.len(), "Related shipments queried");
        Ok(related)
    }
}
