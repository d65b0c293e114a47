//! # Supply-Chain Events
//!
//! Defines all event types that flow through the shared bus. Each corresponds
//! to an event attached to a committed ledger transaction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DLQ_TOPIC;

/// A shipment lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentEvent {
    /// Committing transaction.
    pub tx_id: String,
    /// Event name, e.g. `ShipmentProcessed`.
    pub name: String,
    /// Shipment the event concerns.
    pub shipment_id: String,
    /// Shipment status after the transaction.
    pub status: String,
    /// Full id of the acting party.
    pub actor_id: String,
    /// Complete event payload.
    pub payload: Value,
}

/// An identity directory event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEvent {
    /// Committing transaction.
    pub tx_id: String,
    /// Event name, e.g. `RoleAssigned`.
    pub name: String,
    /// Full id of the identity that changed.
    pub target_id: String,
    /// Full id of the acting party.
    pub actor_id: String,
    /// Complete event payload.
    pub payload: Value,
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SupplyChainEvent {
    // =========================================================================
    // SHIPMENTS
    // =========================================================================
    /// A shipment changed state.
    Shipment(ShipmentEvent),

    // =========================================================================
    // IDENTITY DIRECTORY
    // =========================================================================
    /// An identity was registered or its roles/admin status changed.
    Identity(IdentityEvent),

    // =========================================================================
    // CRITICAL ERRORS (Dead Letter Queue)
    // =========================================================================
    /// A multi-write invariant broke and could not be rolled back.
    /// Routed to the DLQ for operator intervention.
    CriticalError {
        /// Correlation id of the failed invocation.
        correlation_id: String,
        /// Operation that failed.
        operation: String,
        /// Error description.
        error: String,
    },
}

impl SupplyChainEvent {
    /// Convert a committed chaincode event into a bus event.
    ///
    /// Payloads carrying a `shipmentId` become [`SupplyChainEvent::Shipment`];
    /// everything else is treated as an identity event.
    #[must_use]
    pub fn from_chaincode(tx_id: &str, name: &str, payload: &[u8]) -> Self {
        let payload: Value = serde_json::from_slice(payload).unwrap_or(Value::Null);
        let field = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        if payload.get("shipmentId").is_some() {
            Self::Shipment(ShipmentEvent {
                tx_id: tx_id.to_string(),
                name: name.to_string(),
                shipment_id: field("shipmentId"),
                status: field("status"),
                actor_id: field("actorFullId"),
                payload,
            })
        } else {
            Self::Identity(IdentityEvent {
                tx_id: tx_id.to_string(),
                name: name.to_string(),
                target_id: field("targetFullId"),
                actor_id: field("actorFullId"),
                payload,
            })
        }
    }

    /// Topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Shipment(e) => match e.name.as_str() {
                "ShipmentSubmittedForCertification" | "ShipmentCertificationRecorded" => {
                    EventTopic::Certification
                }
                "InputShipmentConsumedInTransformation" | "DerivedProductCreated" => {
                    EventTopic::Transformation
                }
                "ShipmentRecalled" | "ShipmentLinkedToRecall" => EventTopic::Recall,
                "DistributorSensorLogAdded" => EventTopic::ColdChain,
                _ => EventTopic::Lifecycle,
            },
            Self::Identity(_) => EventTopic::Identity,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Shipment id, if the event concerns a shipment.
    #[must_use]
    pub fn shipment_id(&self) -> Option<&str> {
        match self {
            Self::Shipment(e) => Some(&e.shipment_id),
            _ => None,
        }
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Shipment(e) => &e.name,
            Self::Identity(e) => &e.name,
            Self::CriticalError { .. } => "CriticalError",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Create, process, distribute, receive, consume, archive.
    Lifecycle,
    /// Submission and certifier decisions.
    Certification,
    /// Input consumption and derived products.
    Transformation,
    /// Recalls and recall links.
    Recall,
    /// Distributor sensor logs.
    ColdChain,
    /// Identity directory changes.
    Identity,
    /// Critical failures.
    DeadLetterQueue,
    /// Wildcard.
    All,
}

impl EventTopic {
    /// Routing name of the topic.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifecycle => "shipment.lifecycle",
            Self::Certification => "shipment.certification",
            Self::Transformation => "shipment.transformation",
            Self::Recall => "shipment.recall",
            Self::ColdChain => "shipment.coldchain",
            Self::Identity => "identity",
            Self::DeadLetterQueue => DLQ_TOPIC,
            Self::All => "*",
        }
    }
}

/// Filter for selecting which events a subscriber receives.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include; empty means all.
    pub topics: Vec<EventTopic>,
    /// Shipment ids to include; empty means all.
    pub shipment_ids: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            shipment_ids: Vec::new(),
        }
    }

    /// Create a filter following specific shipments.
    #[must_use]
    pub fn for_shipments(ids: Vec<String>) -> Self {
        Self {
            topics: Vec::new(),
            shipment_ids: ids,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SupplyChainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let shipment_match = self.shipment_ids.is_empty()
            || event
                .shipment_id()
                .is_some_and(|id| self.shipment_ids.iter().any(|s| s == id));

        topic_match && shipment_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shipment_event(name: &str, id: &str) -> SupplyChainEvent {
        let payload = json!({"shipmentId": id, "status": "CREATED", "actorFullId": "x509::CN=f"});
        SupplyChainEvent::from_chaincode("tx1", name, payload.to_string().as_bytes())
    }

    #[test]
    fn test_from_chaincode_shipment() {
        let event = shipment_event("ShipmentCreated", "S1");
        let SupplyChainEvent::Shipment(e) = &event else {
            panic!("expected shipment event");
        };
        assert_eq!(e.shipment_id, "S1");
        assert_eq!(e.status, "CREATED");
        assert_eq!(e.actor_id, "x509::CN=f");
        assert_eq!(event.topic(), EventTopic::Lifecycle);
    }

    #[test]
    fn test_from_chaincode_identity() {
        let payload = json!({"targetFullId": "x509::CN=p", "actorFullId": "x509::CN=a"});
        let event =
            SupplyChainEvent::from_chaincode("tx2", "RoleAssigned", payload.to_string().as_bytes());
        assert_eq!(event.topic(), EventTopic::Identity);
        assert_eq!(event.name(), "RoleAssigned");
        assert!(event.shipment_id().is_none());
    }

    #[test]
    fn test_topic_mapping() {
        assert_eq!(shipment_event("ShipmentRecalled", "S1").topic(), EventTopic::Recall);
        assert_eq!(
            shipment_event("DerivedProductCreated", "S1").topic(),
            EventTopic::Transformation
        );
        assert_eq!(
            shipment_event("ShipmentCertificationRecorded", "S1").topic(),
            EventTopic::Certification
        );
        assert_eq!(
            shipment_event("DistributorSensorLogAdded", "S1").topic(),
            EventTopic::ColdChain
        );
        assert_eq!(EventTopic::DeadLetterQueue.as_str(), DLQ_TOPIC);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&shipment_event("ShipmentCreated", "S1")));
    }

    #[test]
    fn test_filter_by_topic_and_shipment() {
        let recall_only = EventFilter::topics(vec![EventTopic::Recall]);
        assert!(recall_only.matches(&shipment_event("ShipmentRecalled", "S1")));
        assert!(!recall_only.matches(&shipment_event("ShipmentCreated", "S1")));

        let s2_only = EventFilter::for_shipments(vec!["S2".into()]);
        assert!(s2_only.matches(&shipment_event("ShipmentCreated", "S2")));
        assert!(!s2_only.matches(&shipment_event("ShipmentCreated", "S1")));
    }
}
