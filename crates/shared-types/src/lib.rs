//! # Shared Types Crate
//!
//! This crate contains the cross-crate types of the Foodtrace ledger: the
//! `AuthenticatedMessage<T>` invocation envelope, the verified caller identity,
//! pagination primitives and the error taxonomy returned by every operation.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Envelope Integrity**: Every operation is invoked through an
//!   `AuthenticatedMessage<T>`; its `caller` is assigned by the trust layer.
//! - **No Redundant Identity**: Payloads MUST NOT contain `requester_id` fields;
//!   the envelope's `caller.full_id` is authoritative.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::AuthenticatedMessage;
pub use errors::*;
