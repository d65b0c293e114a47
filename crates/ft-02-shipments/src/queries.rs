//! Read-only shipment queries.
//!
//! Listings never mutate state. Page sizes are defaulted and clamped by
//! [`ContractConfig::page_size`](crate::config::ContractConfig::page_size).
//! Actionable listings scan a window of `page_size × actionable_scan_multiplier`
//! records and, when the page fills early, hand out a bookmark pointing at the
//! first record they did not look at.

use std::collections::BTreeSet;

use ft_01_identity::Role;
use shared_ledger::{encode_bookmark, Selector, TxContext};
use shared_types::{ContractError, PageRequest};
use tracing::{debug, info};

use crate::contract::FoodtraceContract;
use crate::domain::{
    ActionType, ActionableShipment, ActionablePage, CallerSummary, HistoryEntry, SensorLog,
    Shipment, ShipmentDetails, ShipmentPage, ShipmentStatus, SHIPMENT_OBJECT_TYPE,
};
use crate::ports::ShipmentQueryApi;
use crate::store::decode;

/// The next step `caller` can take on `shipment`, if any.
fn next_action(
    shipment: &Shipment,
    caller: &str,
    roles: &BTreeSet<Role>,
    is_admin: bool,
) -> Option<ActionType> {
    if is_admin {
        return Some(ActionType::AdminAction);
    }
    let has = |role| roles.contains(&role);
    let owns = shipment.current_owner_id == caller;
    let designated_processor = shipment
        .farmer_data
        .as_ref()
        .is_some_and(|f| f.destination_processor_id == caller);

    let action = match shipment.status {
        ShipmentStatus::Created if owns && has(Role::Farmer) => {
            Some(ActionType::SubmitForCertification)
        }
        ShipmentStatus::Created | ShipmentStatus::Certified
            if designated_processor && has(Role::Processor) =>
        {
            Some(ActionType::ProcessShipment)
        }
        ShipmentStatus::PendingCertification if has(Role::Certifier) => {
            Some(ActionType::RecordCertification)
        }
        ShipmentStatus::Processed
            if has(Role::Distributor)
                && shipment
                    .processor_data
                    .as_ref()
                    .is_some_and(|p| p.destination_distributor_id == caller) =>
        {
            Some(ActionType::DistributeShipment)
        }
        ShipmentStatus::Distributed
            if has(Role::Retailer)
                && shipment
                    .distributor_data
                    .as_ref()
                    .is_some_and(|d| d.destination_retailer_id == caller) =>
        {
            Some(ActionType::ReceiveShipment)
        }
        ShipmentStatus::Delivered if owns && has(Role::Retailer) => Some(ActionType::MarkConsumed),
        ShipmentStatus::Delivered if owns && has(Role::Processor) => {
            Some(ActionType::UseInTransformation)
        }
        ShipmentStatus::CertificationRejected if owns => Some(ActionType::ResubmitOrCorrect),
        ShipmentStatus::Recalled | ShipmentStatus::Consumed | ShipmentStatus::ConsumedInProcessing => {
            return None
        }
        _ => None,
    };
    action.or_else(|| owns.then_some(ActionType::InitiateRecall))
}

impl FoodtraceContract {
    fn listing(
        &self,
        ctx: &TxContext<'_>,
        selector: &Selector,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError> {
        let page_size = self.config().page_size(page);
        let (mut shipments, next_bookmark) =
            self.store(ctx).query(selector, page_size, &page.bookmark)?;
        for shipment in &mut shipments {
            self.enrich_aliases(ctx, shipment);
        }
        Ok(ShipmentPage {
            fetched_count: shipments.len(),
            shipments,
            next_bookmark,
        })
    }

    fn active_shipments() -> Selector {
        Selector::new()
            .eq("objectType", SHIPMENT_OBJECT_TYPE)
            .eq("isArchived", false)
    }

    fn actionable(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<(Vec<ActionableShipment>, String, CallerSummary), ContractError> {
        let actor = self.actor(ctx)?;
        let is_admin = self.auth().caller_is_admin(ctx)?;
        let roles: BTreeSet<Role> = self
            .directory()
            .load(ctx, &actor.full_id)?
            .map(|record| record.roles)
            .unwrap_or_default();

        let page_size = self.config().page_size(page) as usize;
        let window = (page_size as u32).saturating_mul(self.config().actionable_scan_multiplier);
        let raw = self.store(ctx).scan_page(window, &page.bookmark)?;

        let mut found = Vec::with_capacity(page_size);
        let mut next_bookmark = raw.bookmark.clone();
        let mut scanned = 0usize;
        for record in &raw.records {
            if found.len() >= page_size {
                next_bookmark = encode_bookmark(&record.key);
                break;
            }
            scanned += 1;
            let Some(mut shipment) = decode(record) else {
                continue;
            };
            if shipment.is_archived || shipment.is_recalled() {
                continue;
            }
            if let Some(action_type) = next_action(&shipment, &actor.full_id, &roles, is_admin) {
                debug!(shipment_id = %shipment.id, action = ?action_type, "Actionable shipment");
                self.enrich_aliases(ctx, &mut shipment);
                found.push(ActionableShipment {
                    shipment,
                    action_type,
                    can_act: true,
                });
            }
        }
        info!(caller = %actor.alias, found = found.len(), scanned, is_admin, "Actionable shipments listed");

        let summary = CallerSummary {
            full_id: actor.full_id,
            alias: actor.alias,
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            is_admin,
        };
        Ok((found, next_bookmark, summary))
    }
}

impl ShipmentQueryApi for FoodtraceContract {
    fn shipment_details(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<ShipmentDetails, ContractError> {
        let store = self.store(ctx);
        let mut shipment = store.require(shipment_id)?;
        self.enrich_aliases(ctx, &mut shipment);
        let history = store.history(shipment_id)?;
        Ok(ShipmentDetails { shipment, history })
    }

    fn shipment_history(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Vec<HistoryEntry>, ContractError> {
        let store = self.store(ctx);
        store.require(shipment_id)?;
        store.history(shipment_id)
    }

    fn my_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError> {
        let selector = Self::active_shipments().eq("currentOwnerId", ctx.caller_id());
        self.listing(ctx, &selector, page)
    }

    fn all_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError> {
        self.auth().require_admin(ctx)?;
        self.listing(ctx, &Self::active_shipments(), page)
    }

    fn shipments_by_status(
        &self,
        ctx: &TxContext<'_>,
        status: &str,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError> {
        let status: ShipmentStatus = status.parse()?;
        let selector = Self::active_shipments().eq("status", status.as_str());
        self.listing(ctx, &selector, page)
    }

    fn actionable_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError> {
        let (found, next_bookmark, _) = self.actionable(ctx, page)?;
        let shipments: Vec<Shipment> = found.into_iter().map(|a| a.shipment).collect();
        Ok(ShipmentPage {
            fetched_count: shipments.len(),
            shipments,
            next_bookmark,
        })
    }

    fn actionable_shipments_with_actions(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ActionablePage, ContractError> {
        let (shipments, next_bookmark, user_info) = self.actionable(ctx, page)?;
        Ok(ActionablePage {
            fetched_count: shipments.len(),
            shipments,
            next_bookmark,
            user_info,
        })
    }

    fn sensor_logs(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Vec<SensorLog>, ContractError> {
        self.read_sensor_logs(ctx, shipment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{LifecycleApi, RecallApi};
    use crate::test_support::*;

    fn ids(page: &ShipmentPage) -> Vec<&str> {
        page.shipments.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_my_shipments_follow_ownership_and_skip_archived() {
        let ledger = network();
        create_raw(&ledger, "S1");
        create_raw(&ledger, "S2");
        create_raw(&ledger, "S3");
        process(&ledger, "S2");
        run(&ledger, ADMIN, |c, ctx| c.archive_shipment(ctx, "S3", "duplicate")).unwrap();

        let mine = run(&ledger, FARMER, |c, ctx| c.my_shipments(ctx, &PageRequest::default())).unwrap();
        assert_eq!(ids(&mine), ["S1"]);
        assert_eq!(mine.shipments[0].current_owner_alias, "farmer");
        let theirs = run(&ledger, PROCESSOR, |c, ctx| c.my_shipments(ctx, &PageRequest::default())).unwrap();
        assert_eq!(ids(&theirs), ["S2"]);
    }

    #[test]
    fn test_listing_pages_with_bookmark() {
        let ledger = network();
        for i in 1..=5 {
            create_raw(&ledger, &format!("S{i}"));
        }
        let first = run(&ledger, ADMIN, |c, ctx| c.all_shipments(ctx, &PageRequest::first(2))).unwrap();
        assert_eq!(ids(&first), ["S1", "S2"]);
        assert_eq!(first.fetched_count, 2);

        let next = PageRequest::first(2).after(first.next_bookmark.clone());
        let second = run(&ledger, ADMIN, |c, ctx| c.all_shipments(ctx, &next)).unwrap();
        assert_eq!(ids(&second), ["S3", "S4"]);

        let err = run(&ledger, FARMER, |c, ctx| c.all_shipments(ctx, &PageRequest::default())).unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized(_)));
    }

    #[test]
    fn test_my_shipments_pages_without_rich_queries() {
        let ledger = shared_ledger::InMemoryLedger::new().without_rich_queries();
        populate(&ledger);
        for i in 0..12 {
            create_raw(&ledger, &format!("S{i:02}"));
        }

        let first = run(&ledger, FARMER, |c, ctx| c.my_shipments(ctx, &PageRequest::first(2))).unwrap();
        assert_eq!(ids(&first), ["S00", "S01"]);
        assert_eq!(first.fetched_count, 2);
        assert!(!first.next_bookmark.is_empty());

        let next = PageRequest::first(5).after(first.next_bookmark.clone());
        let second = run(&ledger, FARMER, |c, ctx| c.my_shipments(ctx, &next)).unwrap();
        assert_eq!(ids(&second), ["S02", "S03", "S04", "S05", "S06"]);
    }

    #[test]
    fn test_by_status_parses_case_insensitively() {
        let ledger = network();
        create_raw(&ledger, "S1");
        create_raw(&ledger, "S2");
        process(&ledger, "S2");

        let processed = run(&ledger, RETAILER, |c, ctx| {
            c.shipments_by_status(ctx, "processed", &PageRequest::default())
        })
        .unwrap();
        assert_eq!(ids(&processed), ["S2"]);

        let err = run(&ledger, RETAILER, |c, ctx| {
            c.shipments_by_status(ctx, "LOST", &PageRequest::default())
        })
        .unwrap_err();
        assert!(matches!(err, ContractError::Validation { .. }));
    }

    #[test]
    fn test_details_and_history() {
        let ledger = network();
        create_raw(&ledger, "S1");
        process(&ledger, "S1");

        let details = run(&ledger, RETAILER, |c, ctx| c.shipment_details(ctx, "S1")).unwrap();
        assert_eq!(details.shipment.status, ShipmentStatus::Processed);
        let actions: Vec<_> = details.history.iter().map(|h| h.action.as_str()).collect();
        assert_eq!(actions, ["CREATED", "PROCESSED"]);

        let err = run(&ledger, RETAILER, |c, ctx| c.shipment_history(ctx, "NOPE")).unwrap_err();
        assert!(matches!(err, ContractError::NotFound { .. }));
    }

    #[test]
    fn test_actionable_reflects_each_role() {
        let ledger = network();
        create_raw(&ledger, "S1");
        create_raw(&ledger, "S2");
        process(&ledger, "S2");
        delivered(&ledger, "S3");
        create_raw(&ledger, "S4");
        run(&ledger, FARMER, |c, ctx| c.initiate_recall(ctx, "S4", "R1", "mould")).unwrap();

        let farmer = run(&ledger, FARMER, |c, ctx| {
            c.actionable_shipments_with_actions(ctx, &PageRequest::default())
        })
        .unwrap();
        let pairs: Vec<_> = farmer
            .shipments
            .iter()
            .map(|a| (a.shipment.id.as_str(), a.action_type))
            .collect();
        assert_eq!(pairs, [("S1", ActionType::SubmitForCertification)]);
        assert_eq!(farmer.user_info.roles, vec!["farmer".to_string()]);
        assert!(!farmer.user_info.is_admin);

        let processor = run(&ledger, PROCESSOR, |c, ctx| {
            c.actionable_shipments_with_actions(ctx, &PageRequest::default())
        })
        .unwrap();
        let pairs: Vec<_> = processor
            .shipments
            .iter()
            .map(|a| (a.shipment.id.as_str(), a.action_type))
            .collect();
        assert_eq!(
            pairs,
            [("S1", ActionType::ProcessShipment), ("S2", ActionType::InitiateRecall)]
        );

        let retailer = run(&ledger, RETAILER, |c, ctx| c.actionable_shipments(ctx, &PageRequest::default()))
            .unwrap();
        assert_eq!(ids(&retailer), ["S3"]);

        let admin = run(&ledger, ADMIN, |c, ctx| {
            c.actionable_shipments_with_actions(ctx, &PageRequest::default())
        })
        .unwrap();
        assert_eq!(admin.fetched_count, 3);
        assert!(admin.shipments.iter().all(|a| a.action_type == ActionType::AdminAction));
    }

    #[test]
    fn test_actionable_bookmark_resumes_after_last_examined() {
        let ledger = network();
        for i in 1..=5 {
            create_raw(&ledger, &format!("S{i}"));
        }
        let first = run(&ledger, ADMIN, |c, ctx| c.actionable_shipments(ctx, &PageRequest::first(2)))
            .unwrap();
        assert_eq!(ids(&first), ["S1", "S2"]);

        let next = PageRequest::first(2).after(first.next_bookmark.clone());
        let second = run(&ledger, ADMIN, |c, ctx| c.actionable_shipments(ctx, &next)).unwrap();
        assert_eq!(ids(&second), ["S3", "S4"]);
    }

    #[test]
    fn test_next_action_rules() {
        let ledger = network();
        let mut s = create_raw(&ledger, "S1");
        let none = BTreeSet::new();
        let retailer: BTreeSet<Role> = [Role::Retailer].into();

        assert_eq!(next_action(&s, "anyone", &none, true), Some(ActionType::AdminAction));
        assert_eq!(next_action(&s, "stranger", &none, false), None);

        s.status = ShipmentStatus::CertificationRejected;
        assert_eq!(next_action(&s, FARMER, &none, false), Some(ActionType::ResubmitOrCorrect));

        s.status = ShipmentStatus::Delivered;
        s.current_owner_id = RETAILER.to_string();
        assert_eq!(next_action(&s, RETAILER, &retailer, false), Some(ActionType::MarkConsumed));

        s.status = ShipmentStatus::Consumed;
        assert_eq!(next_action(&s, RETAILER, &retailer, false), None);
    }
}
