//! Shipment entities and stage payloads.
//!
//! Stored as camelCase JSON under the `Shipment` object type. Collections and
//! the recall block default to empty on read, so records written before a
//! field existed still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::status::{CertificationStatus, ShipmentStatus};

/// Object type tag of shipment records.
pub const SHIPMENT_OBJECT_TYPE: &str = "Shipment";

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Degrees, `-90..=90`.
    pub latitude: f64,
    /// Degrees, `-180..=180`.
    pub longitude: f64,
}

/// Origin facts recorded by the farmer.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerData {
    pub farmer_id: String,
    #[serde(default)]
    pub farmer_alias: String,
    pub farmer_name: String,
    pub farm_location: String,
    pub farm_coordinates: GeoPoint,
    pub crop_type: String,
    pub planting_date: DateTime<Utc>,
    pub harvest_date: DateTime<Utc>,
    pub farming_practice: String,
    pub bed_type: String,
    pub irrigation_method: String,
    #[serde(default)]
    pub fertilizer_used: String,
    #[serde(default)]
    pub certification_document_hash: String,
    #[serde(default)]
    pub certification_document_url: String,
    pub organic_since: Option<DateTime<Utc>>,
    pub buffer_zone_meters: Option<f64>,
    #[serde(default)]
    pub pest_free_confirmation: bool,
    #[serde(default)]
    pub pests_found: Vec<String>,
    #[serde(default)]
    pub pest_treatment_actions: String,
    /// Processor nominated as the next handler (resolved full id).
    pub destination_processor_id: String,
}

/// Processing facts, also used for transformation outputs.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorData {
    pub processor_id: String,
    #[serde(default)]
    pub processor_alias: String,
    pub date_processed: DateTime<Utc>,
    pub processing_type: String,
    pub processing_line_id: String,
    pub processing_location: String,
    pub processing_coordinates: GeoPoint,
    pub contamination_check: String,
    #[serde(default)]
    pub output_batch_id: String,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quality_certifications: Vec<String>,
    /// Distributor nominated as the next handler (resolved full id).
    pub destination_distributor_id: String,
}

/// Transport facts recorded by the distributor.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorData {
    pub distributor_id: String,
    #[serde(default)]
    pub distributor_alias: String,
    pub pickup_date_time: DateTime<Utc>,
    pub delivery_date_time: Option<DateTime<Utc>>,
    pub distribution_line_id: String,
    #[serde(default)]
    pub temperature_range: String,
    pub storage_temperature: Option<f64>,
    #[serde(default)]
    pub transit_location_log: Vec<String>,
    #[serde(default)]
    pub transit_gps_log: Vec<GeoPoint>,
    #[serde(default)]
    pub transport_conditions: String,
    pub distribution_center: String,
    /// Retailer nominated as the next handler (resolved full id).
    pub destination_retailer_id: String,
}

/// Shelf facts recorded by the retailer.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailerData {
    pub retailer_id: String,
    #[serde(default)]
    pub retailer_alias: String,
    pub date_received: DateTime<Utc>,
    pub retailer_line_id: String,
    pub product_name_retail: String,
    #[serde(default)]
    pub shelf_life: String,
    pub sell_by_date: Option<DateTime<Utc>>,
    pub retailer_expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub store_id: String,
    pub store_location: String,
    pub store_coordinates: GeoPoint,
    pub price: Option<f64>,
    #[serde(default)]
    pub qr_code_link: String,
}

/// One certifier decision. Appended, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationRecord {
    pub certifier_id: String,
    #[serde(default)]
    pub certifier_alias: String,
    pub inspection_date: DateTime<Utc>,
    #[serde(default)]
    pub inspection_report_hash: String,
    pub status: CertificationStatus,
    #[serde(default)]
    pub comments: String,
    pub certified_at: DateTime<Utc>,
}

/// Recall state. Present on every shipment; defaults to not recalled.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallInfo {
    #[serde(default)]
    pub is_recalled: bool,
    #[serde(default)]
    pub recall_id: String,
    #[serde(default)]
    pub recall_reason: String,
    pub recall_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recalled_by: String,
    #[serde(default)]
    pub recalled_by_alias: String,
    /// Shipments tied to the same recall id, in link order.
    #[serde(default)]
    pub linked_shipment_ids: Vec<String>,
}

impl RecallInfo {
    /// True when recalled under exactly `recall_id`.
    #[must_use]
    pub fn is_under(&self, recall_id: &str) -> bool {
        self.is_recalled && !self.recall_id.is_empty() && self.recall_id == recall_id
    }
}

/// A cold-chain sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorLog {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub coordinates: GeoPoint,
    /// Distributor that recorded the reading.
    #[serde(default)]
    pub recorded_by: String,
}

/// The central record tracking a product through the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub object_type: String,
    pub id: String,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: f64,
    pub unit_of_measure: String,
    pub current_owner_id: String,
    #[serde(default)]
    pub current_owner_alias: String,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_derived_product: bool,
    #[serde(default)]
    pub input_shipment_ids: Vec<String>,
    #[serde(default)]
    pub farmer_data: Option<FarmerData>,
    #[serde(default)]
    pub certification_records: Vec<CertificationRecord>,
    #[serde(default)]
    pub processor_data: Option<ProcessorData>,
    #[serde(default)]
    pub distributor_data: Option<DistributorData>,
    #[serde(default)]
    pub retailer_data: Option<RetailerData>,
    #[serde(default)]
    pub recall_info: RecallInfo,
    #[serde(default)]
    pub sensor_logs: Vec<SensorLog>,
}

impl Shipment {
    /// Hand the shipment to a new owner.
    pub fn transfer_to(&mut self, owner_id: &str, owner_alias: &str) {
        self.current_owner_id = owner_id.to_string();
        self.current_owner_alias = owner_alias.to_string();
    }

    /// True once recalled.
    #[must_use]
    pub fn is_recalled(&self) -> bool {
        self.recall_info.is_recalled
    }
}

/// One version of a shipment, reconstructed from the ledger's key history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    /// Status at that version, or `DELETED`.
    pub action: String,
    /// Owner at that version.
    pub actor_id: String,
    pub actor_alias: String,
    /// Raw JSON of the version.
    pub value: String,
}

/// A shipment together with its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDetails {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub history: Vec<HistoryEntry>,
}

/// One page of shipments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPage {
    pub shipments: Vec<Shipment>,
    pub next_bookmark: String,
    pub fetched_count: usize,
}

/// A shipment inferred to share contamination risk with a recalled one.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedShipment {
    pub shipment_id: String,
    pub product_name: String,
    pub status: ShipmentStatus,
    pub current_owner_id: String,
    pub current_owner_alias: String,
    pub relation_reason: String,
    /// Actor of the relating event.
    pub actor_id: String,
    pub actor_alias: String,
    /// Processing or distribution line; empty for farm matches.
    pub line_id: String,
    pub event_timestamp: Option<DateTime<Utc>>,
}

/// A shipment id that `add_linked_shipments` did not link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLink {
    pub shipment_id: String,
    pub reason: String,
}

/// Per-item outcome of linking shipments to a recall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub linked: Vec<String>,
    pub skipped: Vec<SkippedLink>,
}

impl LinkReport {
    pub(crate) fn skip(&mut self, shipment_id: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedLink {
            shipment_id: shipment_id.to_string(),
            reason: reason.into(),
        });
    }
}

/// The next step a caller can take on a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    AdminAction,
    SubmitForCertification,
    ProcessShipment,
    RecordCertification,
    DistributeShipment,
    ReceiveShipment,
    MarkConsumed,
    UseInTransformation,
    ResubmitOrCorrect,
    InitiateRecall,
}

/// A shipment annotated with the caller's next action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionableShipment {
    pub shipment: Shipment,
    pub action_type: ActionType,
    pub can_act: bool,
}

/// Who an actionable listing was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerSummary {
    pub full_id: String,
    pub alias: String,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

/// Actionable shipments with per-shipment actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionablePage {
    pub shipments: Vec<ActionableShipment>,
    pub next_bookmark: String,
    pub fetched_count: usize,
    pub user_info: CallerSummary,
}
