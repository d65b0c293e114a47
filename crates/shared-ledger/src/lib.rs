//! # Shared Ledger
//!
//! The key/value ledger seen by the contract crates.
//!
//! ## Capabilities
//!
//! | Capability | Port method |
//! |------------|-------------|
//! | Point reads and writes | `get_state` / `put_state` / `del_state` |
//! | Type-scoped iteration | `state_by_partial_composite_key[_paged]` |
//! | Attribute queries | `query_with_pagination` (may be unsupported) |
//! | Version history | `history_for_key` |
//! | Trusted time | `tx_timestamp` (monotonic per ledger) |
//! | Events | `set_event` |
//!
//! ## Transactions
//!
//! `InMemoryLedger::begin` opens a [`LedgerTransaction`]. Writes are buffered
//! and visible to later reads in the same transaction. `commit` applies the
//! whole write set atomically, or fails with an MVCC conflict when a key read
//! by the transaction changed in between. A dropped transaction leaves no trace.
//!
//! ```ignore
//! let ledger = InMemoryLedger::new();
//! let tx = ledger.begin(&caller);
//! tx.put_state("k", b"v".to_vec())?;
//! let receipt = tx.commit()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod faults;
pub mod keys;
pub mod memory;
pub mod ports;
pub mod query;

pub use context::TxContext;
pub use faults::{FaultOp, FaultyStub};
pub use keys::{create_composite_key, encode_bookmark, split_composite_key};
pub use memory::{CommitReceipt, InMemoryLedger, LedgerTransaction, ManualClock, SystemTimeSource};
pub use ports::{LedgerStub, TimeSource};
pub use query::{ChaincodeEvent, KeyModification, KeyValue, Page, Selector};
