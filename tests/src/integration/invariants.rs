//! # State Machine Walks
//!
//! Seeded random sequences of lifecycle, transformation and recall calls,
//! made by both the right and the wrong participants. After every step:
//!
//! - every shipment's status agrees with the stage payloads it carries
//! - a rejected call changed nothing
//! - recalled and consumed shipments never leave their status

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ft_02_shipments::{
        check_stage_consistency, CertificationInput, DistributorDataInput, FarmerDataInput,
        FoodtraceContract, GeoPoint, InputConsumption, LifecycleApi, NewProduct, NewShipment,
        ProcessorDataInput, RecallApi, RetailerDataInput, SensorLogInput, Shipment,
        ShipmentQueryApi, ShipmentStatus,
    };
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared_ledger::InMemoryLedger;
    use shared_types::ContractError;

    use crate::fixtures::*;

    const CALLERS: &[&str] = &[ADMIN, FARMER, FARMER_B, PROCESSOR, DISTRIBUTOR, RETAILER, CERTIFIER];
    const STEPS: usize = 400;

    struct Walk {
        ledger: InMemoryLedger,
        contract: FoodtraceContract,
        rng: StdRng,
        ids: Vec<String>,
        next_id: usize,
        recalls: Vec<(String, String)>,
    }

    impl Walk {
        fn new(seed: u64) -> Self {
            let (ledger, contract) = bare_network();
            Self {
                ledger,
                contract,
                rng: StdRng::seed_from_u64(seed),
                ids: Vec::new(),
                next_id: 0,
                recalls: Vec::new(),
            }
        }

        fn fresh_id(&mut self, prefix: &str) -> String {
            self.next_id += 1;
            format!("{prefix}{}", self.next_id)
        }

        /// The expected caller most of the time, anyone otherwise.
        fn caller(&mut self, expected: &'static str) -> &'static str {
            if self.rng.gen_bool(0.8) {
                expected
            } else {
                CALLERS.choose(&mut self.rng).copied().unwrap_or(ADMIN)
            }
        }

        fn pick(&mut self) -> String {
            self.ids
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| "NONE".to_string())
        }

        fn snapshot(&self) -> BTreeMap<String, Shipment> {
            self.ids
                .iter()
                .map(|id| {
                    let shipment = run(&self.ledger, &self.contract, ADMIN, |c, ctx| {
                        c.shipment_details(ctx, id)
                    })
                    .unwrap()
                    .shipment;
                    (id.clone(), shipment)
                })
                .collect()
        }

        fn call<T>(
            &self,
            caller: &str,
            op: impl FnOnce(&FoodtraceContract, &shared_ledger::TxContext<'_>) -> Result<T, ContractError>,
        ) -> Result<T, ContractError> {
            run(&self.ledger, &self.contract, caller, op)
        }

        /// One random operation. Returns ids created by it.
        fn step(&mut self) -> (Result<(), ContractError>, Vec<String>) {
            let id = self.pick();
            match self.rng.gen_range(0..12) {
                0 => {
                    let farmer = if self.rng.gen_bool(0.5) { FARMER } else { FARMER_B };
                    let caller = self.caller(farmer);
                    let new_id = self.fresh_id("W");
                    let shipment = NewShipment {
                        shipment_id: new_id.clone(),
                        product_name: "Lettuce".into(),
                        description: String::new(),
                        quantity: f64::from(self.rng.gen_range(1..500_u32)),
                        unit_of_measure: "kg".into(),
                    };
                    let result = self
                        .call(caller, |c, ctx| c.create_shipment(ctx, &shipment, &farmer_input()))
                        .map(drop);
                    (result, vec![new_id])
                }
                1 => {
                    let caller = self.caller(FARMER);
                    (self.call(caller, |c, ctx| c.submit_for_certification(ctx, &id)).map(drop), vec![])
                }
                2 => {
                    let caller = self.caller(CERTIFIER);
                    let status = ["PENDING", "APPROVED", "REJECTED"]
                        .choose(&mut self.rng)
                        .copied()
                        .unwrap_or("APPROVED");
                    let input = CertificationInput {
                        inspection_date: "2025-05-25T00:00:00Z".into(),
                        inspection_report_hash: "hash".into(),
                        certification_status: status.into(),
                        comments: String::new(),
                    };
                    (self.call(caller, |c, ctx| c.record_certification(ctx, &id, &input)).map(drop), vec![])
                }
                3 => {
                    let caller = self.caller(PROCESSOR);
                    (self.call(caller, |c, ctx| c.process_shipment(ctx, &id, &processor_input())).map(drop), vec![])
                }
                4 => {
                    let caller = self.caller(DISTRIBUTOR);
                    (self.call(caller, |c, ctx| c.distribute_shipment(ctx, &id, &distributor_input())).map(drop), vec![])
                }
                5 => {
                    let caller = self.caller(DISTRIBUTOR);
                    let reading = SensorLogInput {
                        timestamp: String::new(),
                        temperature: 4.0,
                        humidity: 50.0,
                        coordinates: Some(GeoPoint { latitude: 45.0, longitude: 7.0 }),
                    };
                    (self.call(caller, |c, ctx| c.add_sensor_log(ctx, &id, &reading)).map(drop), vec![])
                }
                6 => {
                    let caller = self.caller(RETAILER);
                    (self.call(caller, |c, ctx| c.receive_shipment(ctx, &id, &retailer_input())).map(drop), vec![])
                }
                7 => {
                    let caller = self.caller(RETAILER);
                    (self.call(caller, |c, ctx| c.mark_consumed(ctx, &id)).map(drop), vec![])
                }
                8 => {
                    let caller = self.caller(PROCESSOR);
                    let inputs: Vec<InputConsumption> = (0..self.rng.gen_range(1..=2))
                        .map(|_| InputConsumption { shipment_id: self.pick() })
                        .collect();
                    let out_id = self.fresh_id("D");
                    let outputs = vec![NewProduct {
                        new_shipment_id: out_id.clone(),
                        product_name: "Mixed greens".into(),
                        description: String::new(),
                        quantity: 12.0,
                        unit_of_measure: "kg".into(),
                    }];
                    let result = self
                        .call(caller, |c, ctx| {
                            c.transform_and_create_products(ctx, &inputs, &outputs, &processor_input())
                        })
                        .map(drop);
                    (result, vec![out_id])
                }
                9 => {
                    let owner = self
                        .call(ADMIN, |c, ctx| c.shipment_details(ctx, &id))
                        .map(|d| d.shipment.current_owner_id)
                        .unwrap_or_default();
                    let caller = CALLERS
                        .iter()
                        .copied()
                        .find(|c| *c == owner)
                        .unwrap_or(ADMIN);
                    let caller = self.caller(caller);
                    let recall_id = self.fresh_id("R");
                    let result = self.call(caller, |c, ctx| c.initiate_recall(ctx, &id, &recall_id, "contamination"));
                    if result.is_ok() {
                        self.recalls.push((recall_id, id.clone()));
                    }
                    (result.map(drop), vec![])
                }
                10 => {
                    let Some((recall_id, primary)) = self.recalls.choose(&mut self.rng).cloned() else {
                        return (Ok(()), vec![]);
                    };
                    let caller = self.caller(ADMIN);
                    let linked: Vec<String> = (0..3).map(|_| self.pick()).collect();
                    let result = self
                        .call(caller, |c, ctx| c.add_linked_shipments(ctx, &recall_id, &primary, &linked))
                        .map(drop);
                    (result, vec![])
                }
                _ => {
                    let caller = self.caller(ADMIN);
                    let result = if self.rng.gen_bool(0.5) {
                        self.call(caller, |c, ctx| c.archive_shipment(ctx, &id, "walk"))
                    } else {
                        self.call(caller, |c, ctx| c.unarchive_shipment(ctx, &id))
                    };
                    (result.map(drop), vec![])
                }
            }
        }
    }

    fn farmer_input() -> FarmerDataInput {
        FarmerDataInput {
            farmer_name: "Ada".into(),
            farm_location: "North Field".into(),
            farm_coordinates: Some(GeoPoint { latitude: 45.0, longitude: 7.5 }),
            crop_type: "lettuce".into(),
            planting_date: "2025-03-01T00:00:00Z".into(),
            harvest_date: "2025-05-20T00:00:00Z".into(),
            farming_practice: "organic".into(),
            bed_type: "raised".into(),
            irrigation_method: "drip".into(),
            pest_free_confirmation: true,
            destination_processor_id: "processor".into(),
            ..FarmerDataInput::default()
        }
    }

    fn processor_input() -> ProcessorDataInput {
        ProcessorDataInput {
            date_processed: "2025-06-01T08:00:00Z".into(),
            processing_type: "washing".into(),
            processing_line_id: "LINE-1".into(),
            processing_location: "Plant 1".into(),
            processing_coordinates: Some(GeoPoint { latitude: 45.1, longitude: 7.6 }),
            contamination_check: "PASSED".into(),
            destination_distributor_id: "distributor".into(),
            ..ProcessorDataInput::default()
        }
    }

    fn distributor_input() -> DistributorDataInput {
        DistributorDataInput {
            pickup_date_time: "2025-06-02T08:00:00Z".into(),
            distribution_line_id: "TRUCK-7".into(),
            distribution_center: "Hub A".into(),
            destination_retailer_id: "retailer".into(),
            ..DistributorDataInput::default()
        }
    }

    fn retailer_input() -> RetailerDataInput {
        RetailerDataInput {
            date_received: "2025-06-03T08:00:00Z".into(),
            retailer_line_id: "SHELF-3".into(),
            product_name_retail: "Lettuce".into(),
            store_location: "Main St".into(),
            store_coordinates: Some(GeoPoint { latitude: 45.2, longitude: 7.7 }),
            ..RetailerDataInput::default()
        }
    }

    fn walk(seed: u64) {
        let mut walk = Walk::new(seed);
        for step in 0..STEPS {
            let before = walk.snapshot();
            let keys = walk.ledger.len().unwrap();
            let (result, created) = walk.step();

            match &result {
                Ok(()) => {
                    for id in created {
                        walk.ids.push(id);
                    }
                }
                Err(e) => {
                    assert!(
                        !matches!(e, ContractError::InvariantViolation(_)) && !e.is_fatal(),
                        "seed {seed} step {step}: consistency guard tripped: {e}"
                    );
                    assert_eq!(walk.ledger.len().unwrap(), keys, "seed {seed} step {step}: {e}");
                    assert_eq!(walk.snapshot(), before, "seed {seed} step {step}: {e}");
                    continue;
                }
            }

            let after = walk.snapshot();
            for (id, shipment) in &after {
                check_stage_consistency(shipment)
                    .unwrap_or_else(|e| panic!("seed {seed} step {step}: {e}"));
                let Some(old) = before.get(id) else { continue };
                if old.status == ShipmentStatus::Recalled || old.status.is_terminal() {
                    assert_eq!(
                        shipment.status, old.status,
                        "seed {seed} step {step}: {id} left {}",
                        old.status.as_str()
                    );
                }
                if old.status.is_terminal() {
                    assert_eq!(shipment.quantity, old.quantity);
                }
            }
        }
        assert!(!walk.ids.is_empty(), "seed {seed}: walk never created a shipment");
    }

    #[test]
    fn test_random_walks_preserve_invariants() {
        for seed in [7, 42, 1_234, 98_765] {
            walk(seed);
        }
    }
}
