//! # Shared Bus - Event Bus for Committed Ledger Events
//!
//! Events attached to a transaction are only meaningful once it commits. The
//! runtime converts each committed chaincode event into a [`SupplyChainEvent`]
//! and publishes it here; dashboards, notifiers and audit sinks subscribe.
//!
//! ```text
//! ┌──────────────┐   commit    ┌──────────────┐   subscribe()  ┌──────────────┐
//! │  Contract    │ ──────────→ │  Event Bus   │ ─────────────→ │  Consumers   │
//! │  (ledger tx) │  publish()  │              │                │              │
//! └──────────────┘             └──────────────┘                └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Only committed events are published; a failed transaction emits nothing.
//! - Slow subscribers lag and skip, they never block publishers; the loss is
//!   counted per subscription.
//! - Consistency failures are routed to the dead letter topic.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, IdentityEvent, ShipmentEvent, SupplyChainEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic for failed messages.
pub const DLQ_TOPIC: &str = "dlq.critical";
