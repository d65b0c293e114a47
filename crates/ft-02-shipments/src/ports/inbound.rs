//! Inbound ports: the shipment APIs exposed to the gateway.

use shared_ledger::TxContext;
use shared_types::{ContractError, PageRequest};

use crate::domain::{
    ActionablePage, HistoryEntry, LinkReport, RelatedShipment, SensorLog, Shipment,
    ShipmentDetails, ShipmentPage,
};
use crate::validation::{
    CertificationInput, DistributorDataInput, FarmerDataInput, InputConsumption, NewProduct,
    NewShipment, ProcessorDataInput, RetailerDataInput, SensorLogInput,
};

/// State-changing shipment operations.
///
/// Every operation reads and writes inside the caller's transaction, sets
/// `lastUpdatedAt` to the transaction time and emits one event per shipment
/// it changes. Recalled shipments reject all of them.
pub trait LifecycleApi {
    /// Register a new raw shipment. Requires role farmer.
    fn create_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment: &NewShipment,
        farmer_data: &FarmerDataInput,
    ) -> Result<Shipment, ContractError>;

    /// Move a shipment into `PENDING_CERTIFICATION`. Owner or admin.
    fn submit_for_certification(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Shipment, ContractError>;

    /// Append a certifier decision. Requires role certifier.
    fn record_certification(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        decision: &CertificationInput,
    ) -> Result<Shipment, ContractError>;

    /// Record processing. Requires role processor.
    fn process_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        processor_data: &ProcessorDataInput,
    ) -> Result<Shipment, ContractError>;

    /// Record pickup. Requires role distributor and the designation.
    fn distribute_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        distributor_data: &DistributorDataInput,
    ) -> Result<Shipment, ContractError>;

    /// Record arrival at retail. Requires role retailer and the designation.
    fn receive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        retailer_data: &RetailerDataInput,
    ) -> Result<Shipment, ContractError>;

    /// Mark a delivered shipment consumed.
    fn mark_consumed(&self, ctx: &TxContext<'_>, shipment_id: &str)
        -> Result<Shipment, ContractError>;

    /// Hide a shipment from default listings. Admin only, idempotent.
    fn archive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        reason: &str,
    ) -> Result<Shipment, ContractError>;

    /// Undo [`LifecycleApi::archive_shipment`]. Admin only, idempotent.
    fn unarchive_shipment(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Shipment, ContractError>;

    /// Spend input shipments to create derived products. All or nothing.
    fn transform_and_create_products(
        &self,
        ctx: &TxContext<'_>,
        inputs: &[InputConsumption],
        outputs: &[NewProduct],
        processor_data: &ProcessorDataInput,
    ) -> Result<Vec<Shipment>, ContractError>;

    /// Append a cold-chain reading. Requires role distributor.
    fn add_sensor_log(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        reading: &SensorLogInput,
    ) -> Result<Shipment, ContractError>;
}

/// Recall operations.
pub trait RecallApi {
    /// Put a shipment under recall. Owner or admin.
    fn initiate_recall(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        recall_id: &str,
        reason: &str,
    ) -> Result<Shipment, ContractError>;

    /// Tie further shipments to an existing recall. Best effort per item.
    fn add_linked_shipments(
        &self,
        ctx: &TxContext<'_>,
        recall_id: &str,
        primary_shipment_id: &str,
        linked_ids: &[String],
    ) -> Result<LinkReport, ContractError>;

    /// Shipments that plausibly share the recalled shipment's incident.
    /// Admin only, read-only.
    fn query_related_shipments(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        window_hours: Option<i64>,
    ) -> Result<Vec<RelatedShipment>, ContractError>;
}

/// Read-only shipment queries.
pub trait ShipmentQueryApi {
    /// A shipment with aliases filled in and its history attached.
    fn shipment_details(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<ShipmentDetails, ContractError>;

    /// Committed versions of a shipment, oldest first.
    fn shipment_history(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Vec<HistoryEntry>, ContractError>;

    /// Non-archived shipments owned by the caller.
    fn my_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError>;

    /// Every non-archived shipment. Admin only.
    fn all_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError>;

    /// Non-archived shipments in a status.
    fn shipments_by_status(
        &self,
        ctx: &TxContext<'_>,
        status: &str,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError>;

    /// Shipments the caller can act on next.
    fn actionable_shipments(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ShipmentPage, ContractError>;

    /// Like [`ShipmentQueryApi::actionable_shipments`], with the action per
    /// shipment and a summary of the caller.
    fn actionable_shipments_with_actions(
        &self,
        ctx: &TxContext<'_>,
        page: &PageRequest,
    ) -> Result<ActionablePage, ContractError>;

    /// Cold-chain readings of a shipment, for the owner, its distributors
    /// and admins.
    fn sensor_logs(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Vec<SensorLog>, ContractError>;
}
