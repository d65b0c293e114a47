//! # Test Fixtures
//!
//! A bootstrapped node with one participant per role, a publisher that
//! records every event, and JSON payload builders matching what gateway
//! clients send.

use std::sync::Arc;

use async_trait::async_trait;
use ft_01_identity::IdentityDirectoryApi;
use ft_02_shipments::{FoodtraceContract, Shipment, ShipmentQueryApi};
use node_runtime::{FoodtraceService, Invocation, NodeConfig, ServiceError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::{EventPublisher, SupplyChainEvent};
use shared_ledger::{InMemoryLedger, TxContext};
use shared_types::{AuthenticatedMessage, CallerIdentity, ContractError, PageRequest};

pub const ADMIN: &str = "x509::CN=admin::CN=ca";
pub const FARMER: &str = "x509::CN=farmer::CN=ca";
pub const FARMER_B: &str = "x509::CN=farmer-b::CN=ca";
pub const PROCESSOR: &str = "x509::CN=processor::CN=ca";
pub const DISTRIBUTOR: &str = "x509::CN=distributor::CN=ca";
pub const RETAILER: &str = "x509::CN=retailer::CN=ca";
pub const CERTIFIER: &str = "x509::CN=certifier::CN=ca";
pub const OUTSIDER: &str = "x509::CN=outsider::CN=ca";

/// `(full id, alias, role)` of every registered participant.
pub const PARTICIPANTS: &[(&str, &str, &str)] = &[
    (FARMER, "farmer", "farmer"),
    (FARMER_B, "farmer-b", "farmer"),
    (PROCESSOR, "processor", "processor"),
    (DISTRIBUTOR, "distributor", "distributor"),
    (RETAILER, "retailer", "retailer"),
    (CERTIFIER, "certifier", "certifier"),
];

/// Publisher that keeps every event in memory.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<SupplyChainEvent>>,
}

impl RecordingPublisher {
    /// Everything published so far.
    pub fn events(&self) -> Vec<SupplyChainEvent> {
        self.events.lock().clone()
    }

    /// Names of everything published so far.
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.name().to_string()).collect()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: SupplyChainEvent) -> usize {
        self.events.lock().push(event);
        1
    }

    fn events_published(&self) -> u64 {
        self.events.lock().len() as u64
    }
}

/// A node service with the standard participants registered.
pub struct TestNode {
    pub service: FoodtraceService<RecordingPublisher>,
    pub publisher: Arc<RecordingPublisher>,
}

impl TestNode {
    /// Bootstrapped node with default configuration.
    pub async fn new() -> Self {
        Self::with_config(&NodeConfig::default()).await
    }

    /// Bootstrapped node with `config`.
    pub async fn with_config(config: &NodeConfig) -> Self {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = FoodtraceService::from_config(config, Arc::clone(&publisher));
        let node = Self { service, publisher };
        node.submit(ADMIN, "BootstrapLedger", &[]).await.expect("bootstrap");
        for &(full_id, alias, role) in PARTICIPANTS {
            node.submit(ADMIN, "RegisterIdentity", &[full_id, alias])
                .await
                .expect("register");
            node.submit(ADMIN, "AssignRoleToIdentity", &[alias, role])
                .await
                .expect("assign role");
        }
        node.publisher.clear();
        node
    }

    fn message(caller: &str, function: &str, args: &[&str]) -> AuthenticatedMessage<Invocation> {
        AuthenticatedMessage::new(
            CallerIdentity::new(caller),
            Invocation::new(function, args.iter().copied()),
        )
    }

    /// Submit a writing invocation and return its result.
    pub async fn submit(&self, caller: &str, function: &str, args: &[&str]) -> Result<Value, ServiceError> {
        self.service
            .submit(Self::message(caller, function, args))
            .await
            .map(|outcome| outcome.result)
    }

    /// Evaluate a read-only invocation.
    pub async fn evaluate(&self, caller: &str, function: &str, args: &[&str]) -> Result<Value, ServiceError> {
        self.service.evaluate(Self::message(caller, function, args)).await
    }

    /// Current committed state of a shipment.
    pub fn shipment(&self, id: &str) -> Shipment {
        run(self.service.ledger(), self.service.contract(), ADMIN, |c, ctx| {
            c.shipment_details(ctx, id)
        })
        .expect("shipment exists")
        .shipment
    }

    /// Create a raw shipment owned by `farmer`.
    pub async fn create(&self, farmer: &str, id: &str, harvest_date: &str) -> Value {
        let farmer_data = farmer_json(harvest_date);
        self.submit(
            farmer,
            "CreateShipment",
            &[id, "Spinach", "Baby spinach", "250", "kg", farmer_data.as_str()],
        )
        .await
        .expect("create shipment")
    }

    /// Create and process a shipment on `line` at `date_processed`.
    pub async fn processed(&self, id: &str, line: &str, date_processed: &str) {
        self.create(FARMER, id, "2025-05-20T00:00:00Z").await;
        let data = processor_json(line, date_processed);
        self.submit(PROCESSOR, "ProcessShipment", &[id, data.as_str()])
            .await
            .expect("process shipment");
    }

    /// Carry a fresh shipment to `DELIVERED`.
    pub async fn delivered(&self, id: &str) {
        self.processed(id, "LINE-1", "2025-06-01T08:00:00Z").await;
        let pickup = distributor_json("TRUCK-1");
        self.submit(DISTRIBUTOR, "DistributeShipment", &[id, pickup.as_str()])
            .await
            .expect("distribute shipment");
        let arrival = retailer_json();
        self.submit(RETAILER, "ReceiveShipment", &[id, arrival.as_str()])
            .await
            .expect("receive shipment");
    }
}

/// Run `op` in its own committed transaction on `ledger`.
pub fn run<T>(
    ledger: &InMemoryLedger,
    contract: &FoodtraceContract,
    caller: &str,
    op: impl FnOnce(&FoodtraceContract, &TxContext<'_>) -> Result<T, ContractError>,
) -> Result<T, ContractError> {
    let caller = CallerIdentity::new(caller);
    let tx = ledger.begin(&caller);
    let ctx = TxContext::new(&tx, &caller);
    let out = op(contract, &ctx)?;
    tx.commit()?;
    Ok(out)
}

/// A ledger and contract with the standard participants, without the service.
pub fn bare_network() -> (InMemoryLedger, FoodtraceContract) {
    let ledger = InMemoryLedger::new();
    let contract = FoodtraceContract::default();
    run(&ledger, &contract, ADMIN, |c, ctx| c.directory().bootstrap_ledger(ctx)).expect("bootstrap");
    for &(full_id, alias, role) in PARTICIPANTS {
        run(&ledger, &contract, ADMIN, |c, ctx| {
            c.directory().register(ctx, full_id, alias, "")?;
            c.directory().assign_role(ctx, alias, role)
        })
        .expect("register");
    }
    (ledger, contract)
}

/// Every non-archived shipment on the ledger.
pub fn all_shipments(ledger: &InMemoryLedger, contract: &FoodtraceContract) -> Vec<Shipment> {
    let mut out = Vec::new();
    let mut page = PageRequest::first(100);
    loop {
        let batch = run(ledger, contract, ADMIN, |c, ctx| c.all_shipments(ctx, &page))
            .expect("list shipments");
        out.extend(batch.shipments);
        if batch.next_bookmark.is_empty() {
            break;
        }
        page = PageRequest::first(100).after(batch.next_bookmark);
    }
    out
}

pub fn farmer_json(harvest_date: &str) -> String {
    json!({
        "farmerName": "Ada",
        "farmLocation": "North Field",
        "farmCoordinates": { "latitude": 45.0, "longitude": 7.5 },
        "cropType": "spinach",
        "plantingDate": "2025-03-01T00:00:00Z",
        "harvestDate": harvest_date,
        "farmingPractice": "organic",
        "bedType": "raised",
        "irrigationMethod": "drip",
        "pestFreeConfirmation": true,
        "destinationProcessorId": "processor",
    })
    .to_string()
}

pub fn processor_json(line: &str, date_processed: &str) -> String {
    json!({
        "dateProcessed": date_processed,
        "processingType": "washing",
        "processingLineId": line,
        "processingLocation": "Plant 1",
        "processingCoordinates": { "latitude": 45.1, "longitude": 7.6 },
        "contaminationCheck": "PASSED",
        "destinationDistributorId": "distributor",
    })
    .to_string()
}

pub fn distributor_json(line: &str) -> String {
    json!({
        "pickupDateTime": "2025-06-02T08:00:00Z",
        "distributionLineId": line,
        "distributionCenter": "Hub A",
        "destinationRetailerId": "retailer",
    })
    .to_string()
}

pub fn retailer_json() -> String {
    json!({
        "dateReceived": "2025-06-03T08:00:00Z",
        "retailerLineId": "SHELF-3",
        "productNameRetail": "Fresh Spinach",
        "storeLocation": "Main St",
        "storeCoordinates": { "latitude": 45.2, "longitude": 7.7 },
        "price": 3.2,
    })
    .to_string()
}

pub fn sensor_json(temperature: f64) -> String {
    json!({
        "temperature": temperature,
        "humidity": 60.0,
        "coordinates": { "latitude": 45.15, "longitude": 7.65 },
    }).to_string()
}

pub fn products_json(ids: &[&str]) -> String {
    let products: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "newShipmentId": id,
                "productName": "Salad mix",
                "quantity": 40.0,
                "unitOfMeasure": "kg",
            })
        })
        .collect();
    Value::Array(products).to_string()
}

pub fn inputs_json(ids: &[&str]) -> String {
    let inputs: Vec<Value> = ids.iter().map(|id| json!({ "shipmentId": id })).collect();
    Value::Array(inputs).to_string()
}
