//! # Event Publication
//!
//! Every committed chaincode event reaches the bus exactly once, in emission
//! order, tagged with the committing transaction. Rejected invocations
//! publish nothing.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{Invocation, NodeConfig, NodeRuntime};
    use shared_bus::{EventFilter, EventTopic, SupplyChainEvent};
    use shared_types::{AuthenticatedMessage, CallerIdentity};
    use tokio::time::timeout;

    use crate::fixtures::*;

    #[tokio::test]
    async fn test_events_carry_committing_tx() {
        let node = TestNode::new().await;
        let farmer_data = farmer_json("2025-05-20T00:00:00Z");
        let outcome = node
            .service
            .submit(AuthenticatedMessage::new(
                CallerIdentity::new(FARMER),
                Invocation::new(
                    "CreateShipment",
                    ["S1", "Spinach", "", "250", "kg", farmer_data.as_str()],
                ),
            ))
            .await
            .unwrap();
        assert_eq!(outcome.events, 1);

        let events = node.publisher.events();
        let [SupplyChainEvent::Shipment(created)] = events.as_slice() else {
            panic!("expected one shipment event, got {events:?}");
        };
        assert_eq!(created.tx_id, outcome.tx_id);
        assert_eq!(created.name, "ShipmentCreated");
        assert_eq!(created.shipment_id, "S1");
        assert_eq!(created.status, "CREATED");
        assert_eq!(created.actor_id, FARMER);
        assert_eq!(created.payload["destinationProcessorId"], PROCESSOR);
    }

    #[tokio::test]
    async fn test_transformation_events_in_emission_order() {
        let node = TestNode::new().await;
        node.delivered("S1").await;
        node.delivered("S2").await;
        node.publisher.clear();

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

        let events = node.publisher.events();
        let seen: Vec<(&str, &str)> = events
            .iter()
            .map(|e| (e.name(), e.shipment_id().unwrap_or_default()))
            .collect();
        assert_eq!(
            seen,
            [
                ("InputShipmentConsumedInTransformation", "S1"),
                ("InputShipmentConsumedInTransformation", "S2"),
                ("DerivedProductCreated", "P1"),
                ("DerivedProductCreated", "P2"),
            ]
        );
        assert!(events.iter().all(|e| e.topic() == EventTopic::Transformation));
    }

    #[tokio::test]
    async fn test_rejections_publish_nothing() {
        let node = TestNode::new().await;
        node.create(FARMER, "S1", "2025-05-20T00:00:00Z").await;
        node.publisher.clear();

        let data = retailer_json();
        node.submit(RETAILER, "ReceiveShipment", &["S1", data.as_str()])
            .await
            .unwrap_err();
        node.submit(OUTSIDER, "InitiateRecall", &["S1", "R1", "reason"])
            .await
            .unwrap_err();
        node.evaluate(ADMIN, "GetShipmentHistory", &["S1"]).await.unwrap();

        assert!(node.publisher.events().is_empty());
        assert_eq!(node.service.stats().rejected, 2);
    }

    #[tokio::test]
    async fn test_identity_changes_are_published() {
        let node = TestNode::new().await;
        node.submit(ADMIN, "RegisterIdentity", &[OUTSIDER, "outsider"]).await.unwrap();
        node.submit(ADMIN, "AssignRoleToIdentity", &["outsider", "retailer"])
            .await
            .unwrap();
        node.submit(ADMIN, "MakeIdentityAdmin", &["outsider"]).await.unwrap();

        assert_eq!(
            node.publisher.names(),
            ["IdentityRegistered", "RoleAssigned", "AdminGranted"]
        );
        for event in node.publisher.events() {
            let SupplyChainEvent::Identity(e) = event else {
                panic!("expected identity event");
            };
            assert_eq!(e.target_id, OUTSIDER);
            assert_eq!(e.actor_id, ADMIN);
        }
    }

    #[tokio::test]
    async fn test_bus_subscribers_follow_one_shipment() {
        let runtime = Arc::new(NodeRuntime::new(&NodeConfig::default()));
        let mut watch_s2 = runtime.bus().subscribe(EventFilter::for_shipments(vec!["S2".into()]));

        let request = |caller: &str, function: &str, args: Vec<String>| {
            serde_json::json!({ "caller": caller, "function": function, "args": args }).to_string()
        };
        assert!(runtime.handle_line(&request(ADMIN, "BootstrapLedger", vec![])).await.ok);
        let register = request(ADMIN, "RegisterIdentity", vec![FARMER.into(), "farmer".into()]);
        assert!(runtime.handle_line(&register).await.ok);
        let assign = request(ADMIN, "AssignRoleToIdentity", vec!["farmer".into(), "farmer".into()]);
        assert!(runtime.handle_line(&assign).await.ok);
        let register = request(ADMIN, "RegisterIdentity", vec![PROCESSOR.into(), "processor".into()]);
        assert!(runtime.handle_line(&register).await.ok);

        for id in ["S1", "S2"] {
            let create = request(
                FARMER,
                "CreateShipment",
                vec![
                    id.into(),
                    "Spinach".into(),
                    String::new(),
                    "10".into(),
                    "kg".into(),
                    farmer_json("2025-05-20T00:00:00Z"),
                ],
            );
            let response = runtime.handle_line(&create).await;
            assert!(response.ok, "{response:?}");
        }

        let event = timeout(Duration::from_secs(1), watch_s2.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.shipment_id(), Some("S2"));
        assert_eq!(event.name(), "ShipmentCreated");
        assert!(watch_s2.try_recv().unwrap().is_none());
    }
}
