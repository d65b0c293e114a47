//! Ledger ports.

use chrono::{DateTime, Utc};
use shared_types::LedgerError;

use crate::query::{KeyModification, KeyValue, Page, Selector};

/// The ledger as seen from inside one transaction.
///
/// Reads observe the transaction's own pending writes. Nothing is durable
/// until the owning transaction commits.
pub trait LedgerStub: Send + Sync {
    /// Read a key, `None` if absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a key.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn del_state(&self, key: &str) -> Result<(), LedgerError>;

    /// Every entry whose composite key starts with `object_type` + `attributes`.
    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<KeyValue>, LedgerError>;

    /// Paged variant of [`LedgerStub::state_by_partial_composite_key`].
    fn state_by_partial_composite_key_paged(
        &self,
        object_type: &str,
        attributes: &[&str],
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError>;

    /// Attribute query over JSON values.
    ///
    /// Backends without rich-query support return
    /// [`LedgerError::RichQueryUnsupported`]; callers fall back to a scan.
    fn query_with_pagination(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError>;

    /// Committed versions of a key, oldest first.
    fn history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError>;

    /// Id of the running transaction.
    fn tx_id(&self) -> &str;

    /// Trusted transaction timestamp.
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Attach an event, delivered only if the transaction commits.
    fn set_event(&self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError>;
}

/// Time source abstraction (for testing).
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}
