//! # Foodtrace Service
//!
//! The transaction boundary of the node. Each submitted invocation runs in
//! exactly one ledger transaction:
//!
//! ```text
//! AuthenticatedMessage<Invocation>
//!       │ verify_header()
//!       ▼
//! ledger.begin(caller) ──→ dispatch() ──Err──→ transaction dropped, nothing written
//!       │                      │
//!       │                      Ok
//!       ▼                      ▼
//!   commit() ──→ CommitReceipt.events ──→ SupplyChainEvent ──→ Event Bus
//! ```
//!
//! A `ConsistencyFatal` failure is additionally published as a
//! `CriticalError` to the dead letter topic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ft_01_identity::IdentityDirectory;
use ft_02_shipments::FoodtraceContract;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{EventPublisher, SupplyChainEvent};
use shared_ledger::{CommitReceipt, InMemoryLedger, TxContext};
use shared_types::{AuthenticatedMessage, LedgerError, MessageError};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::container::config::NodeConfig;
use crate::handlers::{dispatch, is_read_only, DispatchError, Invocation};

/// Service failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The envelope header was rejected before dispatch.
    #[error("Rejected envelope: {0}")]
    Envelope(#[from] MessageError),

    /// Dispatch or the contract operation failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The transaction could not be committed.
    #[error("Commit failed: {0}")]
    Commit(#[from] LedgerError),

    /// A writing operation was sent to `evaluate`.
    #[error("{0} writes to the ledger and must be submitted")]
    NotReadOnly(String),
}

impl ServiceError {
    /// Gateway error code.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Envelope(_) | Self::NotReadOnly(_) => -32600,
            Self::Dispatch(e) => e.code(),
            Self::Commit(_) => -32030,
        }
    }
}

/// Counters kept by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Invocations received by `submit`.
    pub submitted: u64,
    /// Transactions committed.
    pub committed: u64,
    /// Submissions that ended in an error.
    pub rejected: u64,
    /// Read-only evaluations served.
    pub evaluated: u64,
    /// Events handed to the bus.
    pub events_published: u64,
    /// Consistency failures sent to the dead letter topic.
    pub critical_errors: u64,
}

/// Result of a committed submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Committed transaction id.
    pub tx_id: String,
    /// Transaction timestamp.
    pub timestamp: DateTime<Utc>,
    /// Operation result.
    pub result: Value,
    /// Number of events published.
    pub events: usize,
}

/// Runs contract invocations against a ledger and publishes their events.
pub struct FoodtraceService<P: EventPublisher> {
    ledger: Arc<InMemoryLedger>,
    contract: FoodtraceContract,
    publisher: Arc<P>,
    stats: Mutex<ServiceStats>,
}

impl<P: EventPublisher> FoodtraceService<P> {
    /// Wire a service.
    pub fn new(ledger: Arc<InMemoryLedger>, contract: FoodtraceContract, publisher: Arc<P>) -> Self {
        Self {
            ledger,
            contract,
            publisher,
            stats: Mutex::new(ServiceStats::default()),
        }
    }

    /// Build the ledger and contract described by `config`.
    pub fn from_config(config: &NodeConfig, publisher: Arc<P>) -> Self {
        let mut ledger = InMemoryLedger::new();
        if !config.ledger.rich_queries_enabled {
            ledger = ledger.without_rich_queries();
        }
        let contract = FoodtraceContract::new(
            IdentityDirectory::new(config.identity.clone()),
            config.contract.clone(),
        );
        Self::new(Arc::new(ledger), contract, publisher)
    }

    /// The ledger behind the service.
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// The hosted contract.
    pub fn contract(&self) -> &FoodtraceContract {
        &self.contract
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().clone()
    }

    /// Run a writing invocation in its own transaction.
    ///
    /// Commits only when the operation succeeds; events are published only
    /// after the commit.
    #[instrument(
        skip(self, message),
        fields(correlation_id = %message.correlation_id, function = %message.payload.function)
    )]
    pub async fn submit(
        &self,
        message: AuthenticatedMessage<Invocation>,
    ) -> Result<SubmitOutcome, ServiceError> {
        self.stats.lock().submitted += 1;
        let executed = message
            .verify_header()
            .map_err(ServiceError::from)
            .and_then(|()| self.execute(&message));

        let (result, receipt) = match executed {
            Ok(done) => done,
            Err(e) => {
                self.stats.lock().rejected += 1;
                if matches!(&e, ServiceError::Dispatch(DispatchError::Contract(c)) if c.is_fatal()) {
                    error!(error = %e, "Consistency failure, routing to dead letter topic");
                    self.publisher
                        .publish(SupplyChainEvent::CriticalError {
                            correlation_id: message.correlation_id.to_string(),
                            operation: message.payload.function.clone(),
                            error: e.to_string(),
                        })
                        .await;
                    self.stats.lock().critical_errors += 1;
                } else {
                    warn!(code = e.code(), error = %e, "Invocation rejected");
                }
                return Err(e);
            }
        };

        let events = receipt.events.len();
        for event in &receipt.events {
            let bus_event = SupplyChainEvent::from_chaincode(&receipt.tx_id, &event.name, &event.payload);
            let receivers = self.publisher.publish(bus_event).await;
            debug!(event = %event.name, receivers, "Event published");
        }
        {
            let mut stats = self.stats.lock();
            stats.committed += 1;
            stats.events_published += events as u64;
        }
        info!(tx_id = %receipt.tx_id, events, "Transaction committed");
        Ok(SubmitOutcome {
            tx_id: receipt.tx_id,
            timestamp: receipt.timestamp,
            result,
            events,
        })
    }

    /// Run a read-only invocation. Nothing is ever committed.
    #[instrument(
        skip(self, message),
        fields(correlation_id = %message.correlation_id, function = %message.payload.function)
    )]
    pub async fn evaluate(&self, message: AuthenticatedMessage<Invocation>) -> Result<Value, ServiceError> {
        message.verify_header()?;
        let function = &message.payload.function;
        if !is_read_only(function) {
            return Err(ServiceError::NotReadOnly(function.clone()));
        }
        let tx = self.ledger.begin(&message.caller);
        let ctx = TxContext::new(&tx, &message.caller);
        let result = dispatch(&self.contract, &ctx, &message.payload)?;
        self.stats.lock().evaluated += 1;
        Ok(result)
    }

    fn execute(
        &self,
        message: &AuthenticatedMessage<Invocation>,
    ) -> Result<(Value, CommitReceipt), ServiceError> {
        let tx = self.ledger.begin(&message.caller);
        let ctx = TxContext::new(&tx, &message.caller);
        let result = dispatch(&self.contract, &ctx, &message.payload)?;
        let receipt = tx.commit()?;
        Ok((result, receipt))
    }
}
