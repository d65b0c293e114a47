//! Fault injection for exercising multi-write rollback paths.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared_types::LedgerError;
use tracing::warn;

use crate::ports::LedgerStub;
use crate::query::{KeyModification, KeyValue, Page, Selector};

/// Which write primitive a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    /// `put_state`.
    Put,
    /// `del_state`.
    Delete,
    /// `set_event`, matched on the event name.
    Event,
}

#[derive(Debug)]
struct FaultRule {
    op: FaultOp,
    key_fragment: String,
    allowed: usize,
    seen: usize,
}

/// Wraps a stub and rejects selected writes or events.
///
/// A rule lets the first `allowed` matching writes through and rejects every
/// later one with [`LedgerError::WriteRejected`].
pub struct FaultyStub<'a> {
    inner: &'a dyn LedgerStub,
    rules: Mutex<Vec<FaultRule>>,
}

impl<'a> FaultyStub<'a> {
    /// Wrap a stub with no faults configured.
    pub fn new(inner: &'a dyn LedgerStub) -> Self {
        Self {
            inner,
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Reject `op` on keys (or event names) containing `key_fragment` after
    /// `allowed` successes.
    #[must_use]
    pub fn fail_after(self, op: FaultOp, key_fragment: &str, allowed: usize) -> Self {
        self.rules.lock().push(FaultRule {
            op,
            key_fragment: key_fragment.to_string(),
            allowed,
            seen: 0,
        });
        self
    }

    fn check(&self, op: FaultOp, key: &str) -> Result<(), LedgerError> {
        let mut rules = self.rules.lock();
        for rule in rules
            .iter_mut()
            .filter(|r| r.op == op && key.contains(&r.key_fragment))
        {
            if rule.seen >= rule.allowed {
                warn!(key = %key.replace('\u{0}', "/"), op = ?op, "Injected write fault");
                return Err(LedgerError::WriteRejected {
                    key: key.replace('\u{0}', "/"),
                });
            }
            rule.seen += 1;
        }
        Ok(())
    }
}

impl LedgerStub for FaultyStub<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.inner.get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.check(FaultOp::Put, key)?;
        self.inner.put_state(key, value)
    }

    fn del_state(&self, key: &str) -> Result<(), LedgerError> {
        self.check(FaultOp::Delete, key)?;
        self.inner.del_state(key)
    }

    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<KeyValue>, LedgerError> {
        self.inner.state_by_partial_composite_key(object_type, attributes)
    }

    fn state_by_partial_composite_key_paged(
        &self,
        object_type: &str,
        attributes: &[&str],
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError> {
        self.inner
            .state_by_partial_composite_key_paged(object_type, attributes, page_size, bookmark)
    }

    fn query_with_pagination(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError> {
        self.inner.query_with_pagination(selector, page_size, bookmark)
    }

    fn history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError> {
        self.inner.history_for_key(key)
    }

    fn tx_id(&self) -> &str {
        self.inner.tx_id()
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.inner.tx_timestamp()
    }

    fn set_event(&self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.check(FaultOp::Event, name)?;
        self.inner.set_event(name, payload)
    }
}
