//! Ports for the shipment contract.

pub mod inbound;

pub use inbound::*;
