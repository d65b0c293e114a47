//! # Foodtrace Node Runtime
//!
//! Hosts the shipment ledger contract behind a transaction service and an
//! in-process event bus. The `foodtrace-node` binary in `main.rs` is a thin
//! line-oriented front end over [`NodeRuntime`].
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and the transaction service
//! - `handlers/` - function-name dispatch onto the contract APIs
//! - `runtime.rs` - request handling and background event tasks
//!
//! ## Invocation Flow
//!
//! ```text
//! JSON line ──→ Request ──→ AuthenticatedMessage<Invocation>
//!                               │
//!                 ┌─────────────┴─────────────┐
//!                 ▼                           ▼
//!           submit (commit)            evaluate (read-only)
//!                 │
//!                 ▼
//!        CommitReceipt.events ──→ Event Bus ──→ subscribers / DLQ monitor
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{FoodtraceService, NodeConfig, ServiceError, ServiceStats, SubmitOutcome};
pub use handlers::{dispatch, DispatchError, Invocation};
pub use runtime::{Mode, NodeRuntime, Request, Response};
