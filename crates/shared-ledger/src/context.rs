//! Per-invocation transaction context.

use chrono::{DateTime, Utc};
use shared_types::CallerIdentity;

use crate::ports::LedgerStub;

/// Everything an operation may touch: the ledger (scoped to one transaction)
/// and the verified caller.
#[derive(Clone, Copy)]
pub struct TxContext<'a> {
    stub: &'a dyn LedgerStub,
    caller: &'a CallerIdentity,
}

impl<'a> TxContext<'a> {
    /// Bind a stub and a caller.
    pub fn new(stub: &'a dyn LedgerStub, caller: &'a CallerIdentity) -> Self {
        Self { stub, caller }
    }

    /// The transaction-scoped ledger.
    #[must_use]
    pub fn stub(&self) -> &'a dyn LedgerStub {
        self.stub
    }

    /// The verified caller.
    #[must_use]
    pub fn caller(&self) -> &'a CallerIdentity {
        self.caller
    }

    /// The caller's full id.
    #[must_use]
    pub fn caller_id(&self) -> &'a str {
        &self.caller.full_id
    }

    /// Trusted transaction time.
    #[must_use]
    pub fn tx_timestamp(&self) -> DateTime<Utc> {
        self.stub.tx_timestamp()
    }

    /// Running transaction id.
    #[must_use]
    pub fn tx_id(&self) -> &'a str {
        self.stub.tx_id()
    }
}
