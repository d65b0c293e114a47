//! # Event Subscriber
//!
//! A [`Subscription`] is one broadcast receiver plus the [`EventFilter`] it
//! applies on receive. Filtering is local to the subscriber: every receiver
//! sees every broadcast and discards what it did not ask for.
//!
//! A subscriber that falls more than the bus capacity behind loses the oldest
//! events. The loss is counted in [`Subscription::missed`] and logged; the
//! subscription carries on with the oldest event still buffered.

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

use crate::events::{EventFilter, SupplyChainEvent};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// Filtered view of the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<SupplyChainEvent>,
    filter: EventFilter,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<SupplyChainEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            missed: 0,
        }
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SupplyChainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(count)) => self.record_lag(count),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<SupplyChainEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(count)) => self.record_lag(count),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// The filter applied to this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events lost because this subscriber fell behind.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn record_lag(&mut self, count: u64) {
        self.missed += count;
        warn!(
            lagged = count,
            missed_total = self.missed,
            topics = ?self.filter.topics,
            "Subscriber fell behind, events lost"
        );
    }
}
