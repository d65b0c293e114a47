//! # Invocation Dispatcher
//!
//! Maps a named invocation with ordered string arguments onto the contract
//! APIs. Structured arguments travel as JSON strings.
//!
//! ## Error Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `-32601` | unknown function |
//! | `-32602` | wrong argument count or unparseable argument |
//! | `-320xx` | contract error, see `ContractError::code` |

use ft_01_identity::IdentityDirectoryApi;
use ft_02_shipments::{
    CertificationInput, DistributorDataInput, FarmerDataInput, FoodtraceContract,
    InputConsumption, LifecycleApi, NewProduct, NewShipment, ProcessorDataInput, RecallApi,
    RetailerDataInput, SensorLogInput, ShipmentQueryApi,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_ledger::TxContext;
use shared_types::{ContractError, PageRequest};
use thiserror::Error;
use tracing::{debug, warn};

/// A named contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Operation name, e.g. `CreateShipment`.
    pub function: String,
    /// Ordered arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    /// Build an invocation from anything string-like.
    pub fn new<I, S>(function: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            function: function.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No operation by that name.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong arity or an argument that does not parse.
    #[error("Invalid params for {function}: {reason}")]
    InvalidParams { function: String, reason: String },

    /// The operation itself failed.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DispatchError {
    /// Gateway error code.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownFunction(_) => -32601,
            Self::InvalidParams { .. } => -32602,
            Self::Contract(e) => e.code(),
        }
    }
}

/// Operations that never write.
pub const READ_ONLY: &[&str] = &[
    "ResolveIdentity",
    "GetIdentityInfo",
    "AnyAdminExists",
    "IsAdmin",
    "GetAllIdentities",
    "GetIdentityDetails",
    "GetAllAliases",
    "GetAllAliasesWithDetails",
    "GetAliasesByRole",
    "GetAllRolesWithCounts",
    "GetFullIdForAlias",
    "GetShipmentPublicDetails",
    "GetShipmentHistory",
    "GetMyShipments",
    "GetAllShipments",
    "GetShipmentsByStatus",
    "GetMyActionableShipments",
    "GetMyActionableShipmentsWithActions",
    "GetDistributorSensorLogs",
    "QueryRelatedShipments",
    "GetCallerIdentity",
];

/// True when `function` only reads.
#[must_use]
pub fn is_read_only(function: &str) -> bool {
    READ_ONLY.contains(&function)
}

/// Positional argument access for one invocation.
struct Args<'a> {
    function: &'a str,
    args: &'a [String],
}

impl<'a> Args<'a> {
    fn invalid(&self, reason: impl Into<String>) -> DispatchError {
        DispatchError::InvalidParams {
            function: self.function.to_string(),
            reason: reason.into(),
        }
    }

    /// Require between `min` and `max` arguments.
    fn arity(&self, min: usize, max: usize) -> Result<(), DispatchError> {
        let n = self.args.len();
        if n < min || n > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min}..={max}")
            };
            return Err(self.invalid(format!("expected {expected} arguments, got {n}")));
        }
        Ok(())
    }

    fn str(&self, i: usize) -> &'a str {
        self.args.get(i).map_or("", String::as_str)
    }

    fn json<T: DeserializeOwned>(&self, i: usize, name: &str) -> Result<T, DispatchError> {
        serde_json::from_str(self.str(i)).map_err(|e| self.invalid(format!("{name}: {e}")))
    }

    fn f64(&self, i: usize, name: &str) -> Result<f64, DispatchError> {
        self.str(i)
            .trim()
            .parse()
            .map_err(|_| self.invalid(format!("{name} must be a number")))
    }

    fn page(&self, size_at: usize) -> PageRequest {
        PageRequest::from_raw(self.str(size_at), self.str(size_at + 1))
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, DispatchError> {
    Ok(serde_json::to_value(value).map_err(ContractError::from)?)
}

/// Run one invocation against the contract inside `ctx`.
pub fn dispatch(
    contract: &FoodtraceContract,
    ctx: &TxContext<'_>,
    invocation: &Invocation,
) -> Result<Value, DispatchError> {
    let a = Args {
        function: &invocation.function,
        args: &invocation.args,
    };
    let dir = contract.directory();
    debug!(function = %a.function, args = a.args.len(), "Dispatching invocation");

    match a.function {
        // =====================================================================
        // IDENTITY DIRECTORY
        // =====================================================================
        "BootstrapLedger" => {
            a.arity(0, 0)?;
            to_value(&dir.bootstrap_ledger(ctx)?)
        }
        "RegisterIdentity" => {
            a.arity(2, 3)?;
            to_value(&dir.register(ctx, a.str(0), a.str(1), a.str(2))?)
        }
        "AssignRoleToIdentity" => {
            a.arity(2, 2)?;
            to_value(&dir.assign_role(ctx, a.str(0), a.str(1))?)
        }
        "RemoveRoleFromIdentity" => {
            a.arity(2, 2)?;
            to_value(&dir.remove_role(ctx, a.str(0), a.str(1))?)
        }
        "MakeIdentityAdmin" => {
            a.arity(1, 1)?;
            dir.make_admin(ctx, a.str(0))?;
            Ok(Value::Null)
        }
        "RemoveIdentityAdmin" => {
            a.arity(1, 1)?;
            dir.remove_admin(ctx, a.str(0))?;
            Ok(Value::Null)
        }
        "ResolveIdentity" => {
            a.arity(1, 1)?;
            to_value(&dir.resolve(ctx, a.str(0))?)
        }
        "GetIdentityInfo" => {
            a.arity(1, 1)?;
            to_value(&dir.get_info(ctx, a.str(0))?)
        }
        "AnyAdminExists" => {
            a.arity(0, 0)?;
            to_value(&dir.any_admin_exists(ctx)?)
        }
        "IsAdmin" => {
            a.arity(1, 1)?;
            to_value(&dir.is_admin(ctx, a.str(0))?)
        }
        "GetAllIdentities" => {
            a.arity(0, 0)?;
            to_value(&dir.list_all(ctx)?)
        }
        "GetIdentityDetails" => {
            a.arity(1, 1)?;
            to_value(&dir.identity_details(ctx, a.str(0))?)
        }
        "GetAllAliases" => {
            a.arity(0, 0)?;
            to_value(&dir.list_aliases(ctx)?)
        }
        "GetAllAliasesWithDetails" => {
            a.arity(0, 0)?;
            to_value(&dir.alias_details(ctx)?)
        }
        "GetAliasesByRole" => {
            a.arity(1, 1)?;
            to_value(&dir.aliases_by_role(ctx, a.str(0))?)
        }
        "GetAllRolesWithCounts" => {
            a.arity(0, 0)?;
            to_value(&dir.roles_with_counts(ctx)?)
        }
        "GetFullIdForAlias" => {
            a.arity(1, 1)?;
            to_value(&dir.full_id_for_alias(ctx, a.str(0))?)
        }

        // =====================================================================
        // LIFECYCLE
        // =====================================================================
        "CreateShipment" => {
            a.arity(6, 6)?;
            let shipment = NewShipment {
                shipment_id: a.str(0).to_string(),
                product_name: a.str(1).to_string(),
                description: a.str(2).to_string(),
                quantity: a.f64(3, "quantity")?,
                unit_of_measure: a.str(4).to_string(),
            };
            let farmer: FarmerDataInput = a.json(5, "farmerData")?;
            to_value(&contract.create_shipment(ctx, &shipment, &farmer)?)
        }
        "SubmitForCertification" => {
            a.arity(1, 1)?;
            to_value(&contract.submit_for_certification(ctx, a.str(0))?)
        }
        "RecordCertification" => {
            a.arity(4, 5)?;
            let input = CertificationInput {
                inspection_date: a.str(1).to_string(),
                inspection_report_hash: a.str(2).to_string(),
                certification_status: a.str(3).to_string(),
                comments: a.str(4).to_string(),
            };
            to_value(&contract.record_certification(ctx, a.str(0), &input)?)
        }
        "ProcessShipment" => {
            a.arity(2, 2)?;
            let data: ProcessorDataInput = a.json(1, "processorData")?;
            to_value(&contract.process_shipment(ctx, a.str(0), &data)?)
        }
        "DistributeShipment" => {
            a.arity(2, 2)?;
            let data: DistributorDataInput = a.json(1, "distributorData")?;
            to_value(&contract.distribute_shipment(ctx, a.str(0), &data)?)
        }
        "ReceiveShipment" => {
            a.arity(2, 2)?;
            let data: RetailerDataInput = a.json(1, "retailerData")?;
            to_value(&contract.receive_shipment(ctx, a.str(0), &data)?)
        }
        "MarkShipmentAsConsumed" => {
            a.arity(1, 1)?;
            to_value(&contract.mark_consumed(ctx, a.str(0))?)
        }
        "ArchiveShipment" => {
            a.arity(1, 2)?;
            to_value(&contract.archive_shipment(ctx, a.str(0), a.str(1))?)
        }
        "UnarchiveShipment" => {
            a.arity(1, 1)?;
            to_value(&contract.unarchive_shipment(ctx, a.str(0))?)
        }
        "TransformAndCreateProducts" => {
            a.arity(3, 3)?;
            let inputs: Vec<InputConsumption> = a.json(0, "inputShipments")?;
            let outputs: Vec<NewProduct> = a.json(1, "newProducts")?;
            let data: ProcessorDataInput = a.json(2, "processorData")?;
            to_value(&contract.transform_and_create_products(ctx, &inputs, &outputs, &data)?)
        }
        "AddDistributorSensorLog" => {
            a.arity(2, 2)?;
            let log: SensorLogInput = a.json(1, "sensorLog")?;
            to_value(&contract.add_sensor_log(ctx, a.str(0), &log)?)
        }

        // =====================================================================
        // RECALL
        // =====================================================================
        "InitiateRecall" => {
            a.arity(3, 3)?;
            to_value(&contract.initiate_recall(ctx, a.str(0), a.str(1), a.str(2))?)
        }
        "AddLinkedShipmentsToRecall" => {
            a.arity(3, 3)?;
            let ids: Vec<String> = a.json(2, "linkedShipmentIds")?;
            to_value(&contract.add_linked_shipments(ctx, a.str(0), a.str(1), &ids)?)
        }
        "QueryRelatedShipments" => {
            a.arity(1, 2)?;
            // Unparseable windows fall back to the configured default
            let hours = a.str(1).trim().parse::<i64>().ok();
            to_value(&contract.query_related_shipments(ctx, a.str(0), hours)?)
        }

        // =====================================================================
        // QUERIES
        // =====================================================================
        "GetShipmentPublicDetails" => {
            a.arity(1, 1)?;
            to_value(&contract.shipment_details(ctx, a.str(0))?)
        }
        "GetShipmentHistory" => {
            a.arity(1, 1)?;
            to_value(&contract.shipment_history(ctx, a.str(0))?)
        }
        "GetMyShipments" => {
            a.arity(0, 2)?;
            to_value(&contract.my_shipments(ctx, &a.page(0))?)
        }
        "GetAllShipments" => {
            a.arity(0, 2)?;
            to_value(&contract.all_shipments(ctx, &a.page(0))?)
        }
        "GetShipmentsByStatus" => {
            a.arity(1, 3)?;
            to_value(&contract.shipments_by_status(ctx, a.str(0), &a.page(1))?)
        }
        "GetMyActionableShipments" => {
            a.arity(0, 2)?;
            to_value(&contract.actionable_shipments(ctx, &a.page(0))?)
        }
        "GetMyActionableShipmentsWithActions" => {
            a.arity(0, 2)?;
            to_value(&contract.actionable_shipments_with_actions(ctx, &a.page(0))?)
        }
        "GetDistributorSensorLogs" => {
            a.arity(1, 1)?;
            to_value(&contract.sensor_logs(ctx, a.str(0))?)
        }
        "GetCallerIdentity" => {
            a.arity(0, 0)?;
            let actor = contract.actor(ctx)?;
            Ok(json!({ "fullId": actor.full_id, "alias": actor.alias }))
        }

        other => {
            warn!(function = %other, "Unknown function");
            Err(DispatchError::UnknownFunction(other.to_string()))
        }
    }
}
