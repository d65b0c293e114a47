//! # Node Runtime
//!
//! Owns the service and the event bus, runs background tasks and turns
//! line-delimited JSON requests into invocations.
//!
//! ## Request / Response
//!
//! ```text
//! {"caller":"x509::CN=alice::CN=ca","function":"CreateShipment","args":[...]}
//!     → {"ok":true,"result":{...},"txId":"9f2c..."}
//!     → {"ok":false,"error":{"code":-32014,"message":"..."}}
//! ```
//!
//! `mode` is optional: `submit` commits, `evaluate` only reads, and the
//! default picks `evaluate` for read-only functions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, SupplyChainEvent};
use shared_types::{AuthenticatedMessage, CallerIdentity};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::container::{FoodtraceService, NodeConfig, ServiceError};
use crate::handlers::{is_read_only, Invocation};

/// How a request is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `evaluate` for read-only functions, `submit` otherwise.
    #[default]
    Auto,
    /// Run in a committed transaction.
    Submit,
    /// Run without committing.
    Evaluate,
}

/// One gateway request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Full id asserted by the trust layer.
    pub caller: String,
    /// Membership service provider of the caller.
    #[serde(default)]
    pub msp_id: String,
    /// Contract function name.
    pub function: String,
    /// Positional string arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Execution mode.
    #[serde(default)]
    pub mode: Mode,
}

/// Error body of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Gateway error code.
    pub code: i32,
    /// Human readable message.
    pub message: String,
}

/// One gateway response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// True when the invocation succeeded.
    pub ok: bool,
    /// Operation result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Committed transaction id, for submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
}

impl Response {
    fn success(result: Value, tx_id: Option<String>) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            tx_id,
        }
    }

    fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
            tx_id: None,
        }
    }
}

impl From<ServiceError> for Response {
    fn from(e: ServiceError) -> Self {
        Self::failure(e.code(), e.to_string())
    }
}

/// The running node.
pub struct NodeRuntime {
    service: Arc<FoodtraceService<InMemoryEventBus>>,
    bus: Arc<InMemoryEventBus>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Build the node from a validated configuration.
    pub fn new(config: &NodeConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus.capacity));
        let service = Arc::new(FoodtraceService::from_config(config, Arc::clone(&bus)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            service,
            bus,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// The transaction service.
    pub fn service(&self) -> &Arc<FoodtraceService<InMemoryEventBus>> {
        &self.service
    }

    /// The event bus.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Start background tasks.
    pub fn start(&self) {
        self.spawn_event_logger();
        self.spawn_dead_letter_monitor();
        info!("Foodtrace node started");
    }

    fn spawn_event_logger(&self) {
        let mut subscription = self.bus.subscribe(EventFilter::all());
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(SupplyChainEvent::CriticalError { .. }) => {}
                        Some(event) => debug!(
                            name = %event.name(),
                            shipment_id = event.shipment_id().unwrap_or("-"),
                            "Ledger event"
                        ),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        info!("[events] Shutdown signal received");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_dead_letter_monitor(&self) {
        let mut subscription = self.bus.subscribe(EventFilter::topics(vec![EventTopic::DeadLetterQueue]));
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(SupplyChainEvent::CriticalError { correlation_id, operation, error }) => error!(
                            correlation_id = %correlation_id,
                            operation = %operation,
                            error = %error,
                            "Dead letter: operator intervention required"
                        ),
                        Some(_) => {}
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        info!("[dlq] Shutdown signal received");
                        break;
                    }
                }
            }
        });
    }

    /// Execute one parsed request.
    pub async fn handle(&self, request: Request) -> Response {
        let mut caller = CallerIdentity::new(request.caller);
        caller.msp_id = request.msp_id;
        let evaluate = match request.mode {
            Mode::Auto => is_read_only(&request.function),
            Mode::Submit => false,
            Mode::Evaluate => true,
        };
        let message = AuthenticatedMessage::new(
            caller,
            Invocation {
                function: request.function,
                args: request.args,
            },
        );

        if evaluate {
            match self.service.evaluate(message).await {
                Ok(result) => Response::success(result, None),
                Err(e) => e.into(),
            }
        } else {
            match self.service.submit(message).await {
                Ok(outcome) => Response::success(outcome.result, Some(outcome.tx_id)),
                Err(e) => e.into(),
            }
        }
    }

    /// Parse and execute one JSON request line.
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Malformed request");
                Response::failure(-32700, format!("malformed request: {e}"))
            }
        }
    }

    /// Signal background tasks to stop and give them time to drain.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = self.service.stats();
        info!(
            committed = stats.committed,
            rejected = stats.rejected,
            evaluated = stats.evaluated,
            critical_errors = stats.critical_errors,
            events_published = self.bus.events_published(),
            events_undelivered = self.bus.undelivered(),
            "Shutdown complete"
        );
    }
}
