//! # Transformation and Recall Flows
//!
//! Lineage from spent inputs to derived products, recall propagation across
//! linked shipments and related-shipment inference.

#[cfg(test)]
mod tests {
    use ft_02_shipments::{check_stage_consistency, ShipmentStatus};

    use crate::fixtures::*;

    async fn transformed(node: &TestNode) {
        node.delivered("S1").await;
        node.delivered("S2").await;
        let inputs = inputs_json(&["S1", "S2"]);
        let outputs = products_json(&["P1", "P2"]);
        let data = processor_json("MIX-1", "2025-06-04T08:00:00Z");
        node.submit(
            PROCESSOR,
            "TransformAndCreateProducts",
            &[inputs.as_str(), outputs.as_str(), data.as_str()],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_transformation_records_lineage() {
        let node = TestNode::new().await;
        transformed(&node).await;

        for id in ["S1", "S2"] {
            let input = node.shipment(id);
            assert_eq!(input.status, ShipmentStatus::ConsumedInProcessing);
            assert_eq!(input.quantity, 0.0);
            check_stage_consistency(&input).unwrap();
        }
        for id in ["P1", "P2"] {
            let product = node.shipment(id);
            assert!(product.is_derived_product);
            assert_eq!(product.status, ShipmentStatus::Processed);
            assert_eq!(product.input_shipment_ids, ["S1", "S2"]);
            assert_eq!(product.current_owner_id, PROCESSOR);
            check_stage_consistency(&product).unwrap();
        }

        // Spent inputs cannot be spent twice
        let inputs = inputs_json(&["S1"]);
        let outputs = products_json(&["P3"]);
        let data = processor_json("MIX-1", "2025-06-04T09:00:00Z");
        let err = node
            .submit(
                PROCESSOR,
                "TransformAndCreateProducts",
                &[inputs.as_str(), outputs.as_str(), data.as_str()],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32014);
    }

    #[tokio::test]
    async fn test_recall_propagates_to_linked_products() {
        let node = TestNode::new().await;
        transformed(&node).await;

        let v = node
            .submit(PROCESSOR, "InitiateRecall", &["P1", "R-2025-01", "Listeria detected"])
            .await
            .unwrap();
        assert_eq!(v["status"], "RECALLED");

        let ids = serde_json::json!(["P2", "S1", "GHOST", "P2"]).to_string();
        let report = node
            .submit(
                PROCESSOR,
                "AddLinkedShipmentsToRecall",
                &["R-2025-01", "P1", ids.as_str()],
            )
            .await
            .unwrap();
        assert_eq!(report["linked"], serde_json::json!(["P2"]));
        let skipped: Vec<&str> = report["skipped"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["shipmentId"].as_str().unwrap())
            .collect();
        assert_eq!(skipped, ["S1", "GHOST", "P2"]);

        let p2 = node.shipment("P2");
        assert_eq!(p2.status, ShipmentStatus::Recalled);
        assert_eq!(p2.recall_info.recall_id, "R-2025-01");
        assert_eq!(p2.recall_info.recall_reason, "Listeria detected");
        assert_eq!(p2.recall_info.recalled_by, PROCESSOR);
        assert_eq!(node.shipment("P1").recall_info.linked_shipment_ids, ["P2"]);

        // Recalled shipments are frozen
        let pickup = distributor_json("TRUCK-1");
        let err = node
            .submit(DISTRIBUTOR, "DistributeShipment", &["P2", pickup.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32014);
        let err = node.submit(ADMIN, "ArchiveShipment", &["P2"]).await.unwrap_err();
        assert_eq!(err.code(), -32014);
    }

    #[tokio::test]
    async fn test_only_the_recaller_or_admin_links() {
        let node = TestNode::new().await;
        transformed(&node).await;
        node.submit(PROCESSOR, "InitiateRecall", &["P1", "R1", "Foreign matter"])
            .await
            .unwrap();

        let ids = serde_json::json!(["P2"]).to_string();
        let err = node
            .submit(DISTRIBUTOR, "AddLinkedShipmentsToRecall", &["R1", "P1", ids.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32012);

        let err = node
            .submit(ADMIN, "AddLinkedShipmentsToRecall", &["R9", "P1", ids.as_str()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32014);

        let report = node
            .submit(ADMIN, "AddLinkedShipmentsToRecall", &["R1", "P1", ids.as_str()])
            .await
            .unwrap();
        assert_eq!(report["linked"], serde_json::json!(["P2"]));
    }

    #[tokio::test]
    async fn test_related_shipments_by_processing_line() {
        let node = TestNode::new().await;
        node.processed("S1", "LINE-1", "2025-06-01T08:00:00Z").await;
        node.processed("S2", "LINE-1", "2025-06-01T20:00:00Z").await;

        // Another farm on another line
        node.create(FARMER_B, "S3", "2025-05-20T00:00:00Z").await;
        let data = processor_json("LINE-2", "2025-06-01T09:00:00Z");
        node.submit(PROCESSOR, "ProcessShipment", &["S3", data.as_str()]).await.unwrap();

        node.submit(PROCESSOR, "InitiateRecall", &["S1", "R1", "Salmonella"])
            .await
            .unwrap();

        let related = node.evaluate(ADMIN, "QueryRelatedShipments", &["S1", "24"]).await.unwrap();
        let related = related.as_array().unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0]["shipmentId"], "S2");
        assert_eq!(related[0]["relationReason"], "Same processing line within time window");
        assert_eq!(related[0]["lineId"], "LINE-1");

        // An unparseable window falls back to the configured default
        let fallback = node
            .evaluate(ADMIN, "QueryRelatedShipments", &["S1", "soon"])
            .await
            .unwrap();
        assert_eq!(fallback.as_array().map(Vec::len), Some(1));

        let err = node
            .evaluate(PROCESSOR, "QueryRelatedShipments", &["S1"])
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32012);

        // Outside the line window S2 is still tied to S1 by farm and harvest
        let narrow = node.evaluate(ADMIN, "QueryRelatedShipments", &["S1", "6"]).await.unwrap();
        assert_eq!(narrow[0]["shipmentId"], "S2");
        assert_eq!(narrow[0]["relationReason"], "Same farm and harvest period");
        assert_eq!(narrow[0]["actorAlias"], "farmer");
    }
}
