//! # Event Publisher
//!
//! [`EventPublisher`] is the port the runtime publishes committed events
//! through; [`InMemoryEventBus`] is the single-node implementation over a
//! `tokio::sync::broadcast` channel.
//!
//! Publishing never blocks and never fails. An event published while nobody
//! is subscribed is counted as undelivered and dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventFilter, SupplyChainEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Sink for committed ledger events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event. Returns how many subscribers it reached.
    async fn publish(&self, event: SupplyChainEvent) -> usize;

    /// Events published so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Broadcast bus for one node.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<SupplyChainEvent>,
    published: AtomicU64,
    undelivered: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering up to `capacity` events per subscriber (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
            capacity,
        }
    }

    /// Receive every event published from now on that matches `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, shipments = filter.shipment_ids.len(), "Subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published while nobody was subscribed.
    #[must_use]
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: SupplyChainEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let name = event.name().to_string();
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(name = %name, topic = ?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.undelivered.fetch_add(1, Ordering::Relaxed);
                debug!(name = %name, topic = ?topic, "Event published with no subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
