//! Ports for the identity directory.

pub mod inbound;

pub use inbound::*;
