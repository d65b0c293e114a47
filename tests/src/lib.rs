//! # Foodtrace Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # TestNode, participants, payload builders
//! └── integration/       # Cross-crate flows through the node service
//!     ├── flows.rs       # Farm-to-shelf chain, certification, archive
//!     ├── recall.rs      # Transformation lineage and recall propagation
//!     ├── events.rs      # Committed events reaching the bus
//!     └── invariants.rs  # Seeded random walks over the state machine
//!
//! tests/benches/
//! └── contract_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ft-tests
//! cargo test -p ft-tests integration::recall::
//! cargo bench -p ft-tests
//! ```

pub mod fixtures;
pub mod integration;
