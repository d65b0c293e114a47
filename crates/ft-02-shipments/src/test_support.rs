//! Fixtures shared by the unit tests of this crate.

use ft_01_identity::IdentityDirectoryApi;
use shared_ledger::{InMemoryLedger, TxContext};
use shared_types::{CallerIdentity, ContractError};

use crate::contract::FoodtraceContract;
use crate::domain::{GeoPoint, Shipment};
use crate::ports::LifecycleApi;
use crate::validation::{
    CertificationInput, DistributorDataInput, FarmerDataInput, NewShipment, ProcessorDataInput,
    RetailerDataInput,
};

pub const ADMIN: &str = "x509::CN=admin::CN=ca";
pub const FARMER: &str = "x509::CN=farmer::CN=ca";
pub const PROCESSOR: &str = "x509::CN=processor::CN=ca";
pub const PROCESSOR_B: &str = "x509::CN=processor-b::CN=ca";
pub const DISTRIBUTOR: &str = "x509::CN=distributor::CN=ca";
pub const DISTRIBUTOR_B: &str = "x509::CN=distributor-b::CN=ca";
pub const RETAILER: &str = "x509::CN=retailer::CN=ca";
pub const CERTIFIER: &str = "x509::CN=certifier::CN=ca";

/// Run one operation in its own committed transaction.
pub fn run<T>(
    ledger: &InMemoryLedger,
    caller: &str,
    op: impl FnOnce(&FoodtraceContract, &TxContext<'_>) -> Result<T, ContractError>,
) -> Result<T, ContractError> {
    let caller = CallerIdentity::new(caller);
    let tx = ledger.begin(&caller);
    let ctx = TxContext::new(&tx, &caller);
    let out = op(&FoodtraceContract::default(), &ctx)?;
    tx.commit()?;
    Ok(out)
}

/// A ledger with an admin and one registered participant per role.
pub fn network() -> InMemoryLedger {
    let ledger = InMemoryLedger::new();
    populate(&ledger);
    ledger
}

/// Register the standard participants on `ledger`.
pub fn populate(ledger: &InMemoryLedger) {
    run(ledger, ADMIN, |c, ctx| c.directory().bootstrap_ledger(ctx)).unwrap();
    let parties = [
        (FARMER, "farmer", "farmer"),
        (PROCESSOR, "processor", "processor"),
        (PROCESSOR_B, "processor-b", "processor"),
        (DISTRIBUTOR, "distributor", "distributor"),
        (DISTRIBUTOR_B, "distributor-b", "distributor"),
        (RETAILER, "retailer", "retailer"),
        (CERTIFIER, "certifier", "certifier"),
    ];
    for (full_id, alias, role) in parties {
        run(ledger, ADMIN, |c, ctx| {
            c.directory().register(ctx, full_id, alias, "")?;
            c.directory().assign_role(ctx, alias, role)
        })
        .unwrap();
    }
}

pub fn new_shipment(id: &str) -> NewShipment {
    NewShipment {
        shipment_id: id.to_string(),
        product_name: "Carrots".into(),
        description: "Organic carrots".into(),
        quantity: 100.0,
        unit_of_measure: "kg".into(),
    }
}

pub fn farmer_input() -> FarmerDataInput {
    FarmerDataInput {
        farmer_name: "Ada".into(),
        farm_location: "North Field".into(),
        farm_coordinates: Some(GeoPoint { latitude: 45.0, longitude: 7.5 }),
        crop_type: "carrot".into(),
        planting_date: "2025-02-01T00:00:00Z".into(),
        harvest_date: "2025-05-20T00:00:00Z".into(),
        farming_practice: "organic".into(),
        bed_type: "raised".into(),
        irrigation_method: "drip".into(),
        pest_free_confirmation: true,
        destination_processor_id: "processor".into(),
        ..FarmerDataInput::default()
    }
}

pub fn processor_input_at(line: &str, date_processed: &str) -> ProcessorDataInput {
    ProcessorDataInput {
        date_processed: date_processed.to_string(),
        processing_type: "washing".into(),
        processing_line_id: line.to_string(),
        processing_location: "Plant 1".into(),
        processing_coordinates: Some(GeoPoint { latitude: 45.1, longitude: 7.6 }),
        contamination_check: "PASSED".into(),
        destination_distributor_id: "distributor".into(),
        ..ProcessorDataInput::default()
    }
}

pub fn processor_input() -> ProcessorDataInput {
    processor_input_at("LINE-1", "2025-06-01T08:00:00Z")
}

pub fn distributor_input() -> DistributorDataInput {
    DistributorDataInput {
        pickup_date_time: "2025-06-02T08:00:00Z".into(),
        distribution_line_id: "TRUCK-7".into(),
        distribution_center: "Hub A".into(),
        destination_retailer_id: "retailer".into(),
        ..DistributorDataInput::default()
    }
}

pub fn retailer_input() -> RetailerDataInput {
    RetailerDataInput {
        date_received: "2025-06-03T08:00:00Z".into(),
        retailer_line_id: "SHELF-3".into(),
        product_name_retail: "Fresh Carrots".into(),
        store_location: "Main St".into(),
        store_coordinates: Some(GeoPoint { latitude: 45.2, longitude: 7.7 }),
        price: Some(2.5),
        ..RetailerDataInput::default()
    }
}

pub fn certification(status: &str) -> CertificationInput {
    CertificationInput {
        inspection_date: "2025-06-01T00:00:00Z".into(),
        inspection_report_hash: "abc123".into(),
        certification_status: status.to_string(),
        comments: String::new(),
    }
}

pub fn create_raw(ledger: &InMemoryLedger, id: &str) -> Shipment {
    run(ledger, FARMER, |c, ctx| {
        c.create_shipment(ctx, &new_shipment(id), &farmer_input())
    })
    .unwrap()
}

pub fn process(ledger: &InMemoryLedger, id: &str) -> Shipment {
    run(ledger, PROCESSOR, |c, ctx| {
        c.process_shipment(ctx, id, &processor_input())
    })
    .unwrap()
}

/// Create a shipment and carry it to `DELIVERED`.
pub fn delivered(ledger: &InMemoryLedger, id: &str) -> Shipment {
    create_raw(ledger, id);
    process(ledger, id);
    run(ledger, DISTRIBUTOR, |c, ctx| {
        c.distribute_shipment(ctx, id, &distributor_input())
    })
    .unwrap();
    run(ledger, RETAILER, |c, ctx| c.receive_shipment(ctx, id, &retailer_input())).unwrap()
}
