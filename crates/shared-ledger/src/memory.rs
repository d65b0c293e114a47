//! In-memory ledger with buffered transactions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use shared_types::{CallerIdentity, LedgerError};
use tracing::debug;

use crate::keys::{create_composite_key, decode_bookmark, encode_bookmark};
use crate::ports::{LedgerStub, TimeSource};
use crate::query::{ChaincodeEvent, KeyModification, KeyValue, Page, Selector};

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct Versioned {
    value: Vec<u8>,
    version: u64,
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Committed transaction id.
    pub tx_id: String,
    /// Transaction timestamp.
    pub timestamp: DateTime<Utc>,
    /// Events in emission order.
    pub events: Vec<ChaincodeEvent>,
    /// Number of keys written or deleted.
    pub writes: usize,
}

/// In-memory implementation of the ledger for tests and single-node runs.
pub struct InMemoryLedger {
    state: RwLock<BTreeMap<String, Versioned>>,
    history: RwLock<HashMap<String, Vec<KeyModification>>>,
    clock: Arc<dyn TimeSource>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    rich_queries: bool,
    commit_seq: AtomicU64,
    tx_counter: AtomicU64,
}

impl InMemoryLedger {
    /// Ledger with rich queries enabled and the system clock.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BTreeMap::new()),
            history: RwLock::new(HashMap::new()),
            clock: Arc::new(SystemTimeSource),
            last_timestamp: Mutex::new(None),
            rich_queries: true,
            commit_seq: AtomicU64::new(0),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Disable attribute queries, forcing callers onto their scan fallback.
    #[must_use]
    pub fn without_rich_queries(mut self) -> Self {
        self.rich_queries = false;
        self
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether attribute queries are served.
    #[must_use]
    pub fn rich_queries_enabled(&self) -> bool {
        self.rich_queries
    }

    /// Open a transaction on behalf of `caller`.
    pub fn begin(&self, caller: &CallerIdentity) -> LedgerTransaction<'_> {
        let timestamp = self.next_timestamp();
        let nonce = self.tx_counter.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(caller.full_id.as_bytes());
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.update(nonce.to_be_bytes());
        let tx_id = hex::encode(hasher.finalize());

        debug!(tx_id = %tx_id, caller = %caller, "Transaction opened");
        LedgerTransaction {
            ledger: self,
            tx_id,
            timestamp,
            writes: Mutex::new(BTreeMap::new()),
            reads: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Committed value of a key, bypassing any transaction.
    pub fn committed_value(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.get(key).map(|v| v.value.clone()))
    }

    /// Number of committed keys.
    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.len())
    }

    /// True when nothing has been committed.
    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        let mut last = self.last_timestamp.lock();
        let ts = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(ts);
        ts
    }

    fn committed_range(&self, prefix: &str) -> Result<BTreeMap<String, Vec<u8>>, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered transaction against an [`InMemoryLedger`].
pub struct LedgerTransaction<'a> {
    ledger: &'a InMemoryLedger,
    tx_id: String,
    timestamp: DateTime<Utc>,
    /// `None` marks a pending delete.
    writes: Mutex<BTreeMap<String, Option<Vec<u8>>>>,
    /// Version observed per key; `0` means absent.
    reads: Mutex<HashMap<String, u64>>,
    events: Mutex<Vec<ChaincodeEvent>>,
}

impl LedgerTransaction<'_> {
    /// Number of pending writes and deletes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.lock().len()
    }

    /// Apply the write set atomically.
    ///
    /// # Errors
    ///
    /// [`LedgerError::MvccConflict`] when a key read by this transaction was
    /// changed by another commit.
    pub fn commit(self) -> Result<CommitReceipt, LedgerError> {
        let writes = self.writes.into_inner();
        let reads = self.reads.into_inner();
        let events = self.events.into_inner();

        let mut state = self
            .ledger
            .state
            .write()
            .map_err(|_| LedgerError::LockPoisoned)?;

        for (key, seen) in &reads {
            let current = state.get(key).map_or(0, |v| v.version);
            if current != *seen {
                return Err(LedgerError::MvccConflict { key: key.clone() });
            }
        }

        let mut history = self
            .ledger
            .history
            .write()
            .map_err(|_| LedgerError::LockPoisoned)?;
        let version = self.ledger.commit_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let count = writes.len();

        for (key, write) in writes {
            let modification = match write {
                Some(value) => {
                    state.insert(
                        key.clone(),
                        Versioned {
                            value: value.clone(),
                            version,
                        },
                    );
                    KeyModification {
                        tx_id: self.tx_id.clone(),
                        timestamp: self.timestamp,
                        is_delete: false,
                        value,
                    }
                }
                None => {
                    state.remove(&key);
                    KeyModification {
                        tx_id: self.tx_id.clone(),
                        timestamp: self.timestamp,
                        is_delete: true,
                        value: Vec::new(),
                    }
                }
            };
            history.entry(key).or_default().push(modification);
        }

        debug!(tx_id = %self.tx_id, writes = count, events = events.len(), "Transaction committed");
        Ok(CommitReceipt {
            tx_id: self.tx_id,
            timestamp: self.timestamp,
            events,
            writes: count,
        })
    }

    fn merged_range(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let mut merged = self.ledger.committed_range(prefix)?;
        let writes = self.writes.lock();
        for (key, write) in writes.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match write {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

fn paginate(
    entries: impl Iterator<Item = (String, Vec<u8>)>,
    page_size: u32,
    bookmark: &str,
) -> Result<Page, LedgerError> {
    let start = decode_bookmark(bookmark)?;
    let limit = page_size.max(1) as usize;
    let mut iter = entries
        .filter(|(k, _)| start.as_ref().map_or(true, |s| k >= s))
        .peekable();

    let mut records = Vec::with_capacity(limit);
    while records.len() < limit {
        match iter.next() {
            Some((key, value)) => records.push(KeyValue { key, value }),
            None => break,
        }
    }
    let bookmark = iter
        .peek()
        .map(|(k, _)| encode_bookmark(k))
        .unwrap_or_default();
    let fetched = records.len();
    Ok(Page {
        records,
        bookmark,
        fetched,
    })
}

impl LedgerStub for LedgerTransaction<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(pending) = self.writes.lock().get(key) {
            return Ok(pending.clone());
        }
        let state = self
            .ledger
            .state
            .read()
            .map_err(|_| LedgerError::LockPoisoned)?;
        let found = state.get(key);
        self.reads
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| found.map_or(0, |v| v.version));
        Ok(found.map(|v| v.value.clone()))
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::WriteRejected { key: String::new() });
        }
        self.writes.lock().insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), LedgerError> {
        self.writes.lock().insert(key.to_string(), None);
        Ok(())
    }

    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<KeyValue>, LedgerError> {
        let prefix = create_composite_key(object_type, attributes)?;
        Ok(self
            .merged_range(&prefix)?
            .into_iter()
            .map(|(key, value)| KeyValue { key, value })
            .collect())
    }

    fn state_by_partial_composite_key_paged(
        &self,
        object_type: &str,
        attributes: &[&str],
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError> {
        let prefix = create_composite_key(object_type, attributes)?;
        paginate(self.merged_range(&prefix)?.into_iter(), page_size, bookmark)
    }

    fn query_with_pagination(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page, LedgerError> {
        if !self.ledger.rich_queries {
            return Err(LedgerError::RichQueryUnsupported);
        }
        let matching = self
            .merged_range("")?
            .into_iter()
            .filter(|(_, v)| selector.matches_bytes(v));
        paginate(matching, page_size, bookmark)
    }

    fn history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError> {
        let history = self
            .ledger
            .history
            .read()
            .map_err(|_| LedgerError::LockPoisoned)?;
        Ok(history.get(key).cloned().unwrap_or_default())
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn set_event(&self, name: &str, payload: Vec<u8>) -> Result<(), LedgerError> {
        self.events.lock().push(ChaincodeEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}
