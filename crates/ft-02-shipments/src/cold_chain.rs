//! Cold-chain sensor readings recorded by distributors in transit.
//!
//! Appending requires the distributor role and one of:
//!
//! | Status | Caller must be |
//! |--------|----------------|
//! | `PROCESSED` | the designated distributor |
//! | `DISTRIBUTED` | the distributor recorded at pickup |
//!
//! Reading is open to the owner, the designated or recorded distributor and
//! administrators at any status.

use ft_01_identity::{Designation, Role};
use serde_json::json;
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::{info, warn};

use crate::contract::FoodtraceContract;
use crate::domain::{SensorLog, Shipment, ShipmentStatus};
use crate::events::{emit, ShipmentEventKind};
use crate::lifecycle::ensure_not_recalled;
use crate::validation::SensorLogInput;

impl FoodtraceContract {
    pub(crate) fn append_sensor_log(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
        reading: &SensorLogInput,
    ) -> Result<Shipment, ContractError> {
        const OP: &str = "add sensor log";
        self.auth().require_role(ctx, Role::Distributor)?;
        let now = ctx.tx_timestamp();
        let mut log = self.validator().sensor_log(reading, now)?;
        let mut shipment = self.store(ctx).require(shipment_id)?;
        ensure_not_recalled(&shipment, OP)?;

        match shipment.status {
            ShipmentStatus::Processed => {
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
            }
            ShipmentStatus::Distributed => {
                let recorded = shipment
                    .distributor_data
                    .as_ref()
                    .map(|d| d.distributor_id.as_str())
                    .unwrap_or_default();
                if recorded != ctx.caller_id() {
                    warn!(shipment_id = %shipment_id, caller = %ctx.caller_id(), "Sensor log from a foreign distributor rejected");
                    return Err(ContractError::Unauthorized(format!(
                        "only the distributor handling shipment '{shipment_id}' may log readings"
                    )));
                }
            }
            other => {
                return Err(ContractError::state(
                    shipment_id,
                    other.as_str(),
                    "sensor logs require status PROCESSED or DISTRIBUTED",
                ))
            }
        }

        let actor = self.actor(ctx)?;
        log.recorded_by = actor.full_id.clone();
        let (temperature, humidity, timestamp) = (log.temperature, log.humidity, log.timestamp);
        shipment.sensor_logs.push(log);
        shipment.last_updated_at = now;
        self.store(ctx).save(&shipment)?;
        emit(
            ctx,
            ShipmentEventKind::SensorLogAdded,
            &shipment,
            &actor,
            json!({
                "temperature": temperature,
                "humidity": humidity,
                "readingTimestamp": timestamp,
            }),
        )?;
        info!(
            shipment_id = %shipment_id,
            distributor = %actor.alias,
            readings = shipment.sensor_logs.len(),
            "Sensor log added"
        );
        Ok(shipment)
    }

    pub(crate) fn read_sensor_logs(
        &self,
        ctx: &TxContext<'_>,
        shipment_id: &str,
    ) -> Result<Vec<SensorLog>, ContractError> {
        let shipment = self.store(ctx).require(shipment_id)?;
        let caller = ctx.caller_id();
        let involved = shipment.current_owner_id == caller
            || shipment
                .distributor_data
                .as_ref()
                .is_some_and(|d| d.distributor_id == caller)
            || shipment
                .processor_data
                .as_ref()
                .is_some_and(|p| p.destination_distributor_id == caller);
        if !involved && !self.auth().caller_is_admin(ctx)? {
            return Err(ContractError::Unauthorized(format!(
                "caller is not involved in shipment '{shipment_id}'"
            )));
        }
        Ok(shipment.sensor_logs)
    }
}
