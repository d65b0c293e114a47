//! # Integration Test Flows
//!
//! Drives whole shipment journeys through the node service exactly as a
//! gateway client would: function names, string arguments, JSON payloads.
//!
//! ## Flows Tested:
//!
//! 1. **Farm to shelf**: create, certify, process, distribute, log, receive, consume
//! 2. **Hand-off designation**: only the nominated party may take the next step
//! 3. **Archive**: archived shipments leave listings and reject transitions
//! 4. **Atomicity**: a rejected invocation leaves the ledger untouched

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::fixtures::*;

    fn status(v: &Value) -> &str {
        v["status"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_farm_to_shelf_chain() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;

        let v = node.submit(FARMER, "SubmitForCertification", &["S1"]).await.unwrap();
        assert_eq!(status(&v), "PENDING_CERTIFICATION");
        let v = node
            .submit(
                CERTIFIER,
                "RecordCertification",
                &["S1", "2025-05-25T00:00:00Z", "report-hash", "APPROVED", "clean"],
            )
            .await
            .unwrap();
        assert_eq!(status(&v), "CERTIFIED");

        let data = processor_json("LINE-1", "2025-06-01T08:00:00Z");
        let v = node.submit(PROCESSOR, "ProcessShipment", &["S1", data.as_str()]).await.unwrap();
        assert_eq!(status(&v), "PROCESSED");
        assert_eq!(v["currentOwnerId"], PROCESSOR);

        let data = distributor_json("TRUCK-1");
        let v = node.submit(DISTRIBUTOR, "DistributeShipment", &["S1", data.as_str()]).await.unwrap();
        assert_eq!(status(&v), "DISTRIBUTED");
        assert_eq!(v["currentOwnerId"], DISTRIBUTOR);

        let reading = sensor_json(3.8);
        node.submit(DISTRIBUTOR, "AddDistributorSensorLog", &["S1", reading.as_str()])
            .await
            .unwrap();

        let data = retailer_json();
        let v = node.submit(RETAILER, "ReceiveShipment", &["S1", data.as_str()]).await.unwrap();
        assert_eq!(status(&v), "DELIVERED");
        assert_eq!(v["currentOwnerId"], RETAILER);

        let v = node.submit(RETAILER, "MarkShipmentAsConsumed", &["S1"]).await.unwrap();
        assert_eq!(status(&v), "CONSUMED");

        let history = node.evaluate(ADMIN, "GetShipmentHistory", &["S1"]).await.unwrap();
        let actions: Vec<&str> = history
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["action"].as_str().unwrap())
            .collect();
        assert_eq!(
            actions,
            [
                "CREATED",
                "PENDING_CERTIFICATION",
                "CERTIFIED",
                "PROCESSED",
                "DISTRIBUTED",
                "DISTRIBUTED",
                "DELIVERED",
                "CONSUMED"
            ]
        );

        // The retailer still owns the readings taken in transit
        let logs = node.evaluate(RETAILER, "GetDistributorSensorLogs", &["S1"]).await.unwrap();
        assert_eq!(logs.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_only_designated_parties_take_hand_offs() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;

        // Registered processors other than the nominated one are refused
        node.submit(ADMIN, "AssignRoleToIdentity", &["farmer-b", "processor"])
            .await
            .unwrap();
        let data = processor_json("LINE-1", "2025-06-01T08:00:00Z");
        let err = node
            .submit(FARMER_B, "ProcessShipment", &["S1", data.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32012);

        // An unregistered caller gets no further than the role check
        let err = node
            .submit(OUTSIDER, "ProcessShipment", &["S1", data.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32012);

        node.submit(PROCESSOR, "ProcessShipment", &["S1", data.as_str()]).await.unwrap();

        // Retail receipt before pickup is a state error
        let arrival = retailer_json();
        let err = node
            .submit(RETAILER, "ReceiveShipment", &["S1", arrival.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32014);
    }

    #[tokio::test]
    async fn test_archive_hides_and_freezes() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;
        node.create(FARMER, "S2", "2025-05-20T00:00:00Z").await;

        node.submit(ADMIN, "ArchiveShipment", &["S1", "duplicate entry"]).await.unwrap();
        let mine = node.evaluate(FARMER, "GetMyShipments", &[]).await.unwrap();
        let ids: Vec<&str> = mine["shipments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["S2"]);

        let data = processor_json("LINE-1", "2025-06-01T08:00:00Z");
        let err = node
            .submit(PROCESSOR, "ProcessShipment", &["S1", data.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32014);

        node.submit(ADMIN, "UnarchiveShipment", &["S1"]).await.unwrap();
        node.submit(PROCESSOR, "ProcessShipment", &["S1", data.as_str()]).await.unwrap();
        assert!(!node.shipment("S1").is_archived);
    }

    #[tokio::test]
    async fn test_rejected_invocation_leaves_ledger_untouched() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;
        let before = node.shipment("S1");
        let keys = node.service.ledger().len().unwrap();

        // Duplicate id
        let farmer_data = farmer_json("2025-05-20T00:00:00Z");
        let err = node
            .submit(
                FARMER,
                "CreateShipment",
                &["S1", "Kale", "", "10", "kg", farmer_data.as_str()],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32013);

        // Validation failure deep inside a payload
        let err = node
            .submit(PROCESSOR, "ProcessShipment", &["S1", r#"{"processingType":"washing"}"#])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32010);

        assert_eq!(node.service.ledger().len().unwrap(), keys);
        assert_eq!(node.shipment("S1"), before);
        assert!(node.publisher.names().iter().all(|n| n == "ShipmentCreated"));
    }

    #[tokio::test]
    async fn test_actionable_listing_follows_the_chain() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;
        node.create(FARMER, "S2", "2025-05-20T00:00:00Z").await;

        let page = node
            .evaluate(PROCESSOR, "GetMyActionableShipmentsWithActions", &[])
            .await
            .unwrap();
        let entries = page["shipments"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(page["userInfo"]["alias"], "processor");

        let data = processor_json("LINE-1", "2025-06-01T08:00:00Z");
        node.submit(PROCESSOR, "ProcessShipment", &["S1", data.as_str()]).await.unwrap();

        let page = node.evaluate(DISTRIBUTOR, "GetMyActionableShipments", &[]).await.unwrap();
        let ids: Vec<&str> = page["shipments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["S1"]);
    }
}
