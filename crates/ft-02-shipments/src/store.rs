//! # Shipment Record Store
//!
//! Keyed persistence for shipments under the `Shipment` object type.
//!
//! Every write passes [`check_stage_consistency`] first, so no status/payload
//! mismatch can reach the ledger. Attribute queries try the ledger's rich
//! query and fall back to a paged scan filtered by the same selector when
//! the backend does not support one; any other query failure propagates.
//!
//! Scans skip records that no longer decode, logging each one, so a single
//! corrupt value cannot take down a listing.

use serde_json::Value;
use shared_ledger::{create_composite_key, encode_bookmark, KeyValue, LedgerStub, Page, Selector, TxContext};
use shared_types::{ContractError, EntityKind, LedgerError};
use tracing::{debug, warn};

use crate::domain::{check_stage_consistency, HistoryEntry, Shipment, SHIPMENT_OBJECT_TYPE};

/// Shipment persistence over the running transaction.
#[derive(Clone, Copy)]
pub struct ShipmentStore<'a> {
    stub: &'a dyn LedgerStub,
}

/// Ledger key of a shipment.
pub fn shipment_key(id: &str) -> Result<String, ContractError> {
    if id.trim().is_empty() {
        return Err(ContractError::validation("shipmentId", "cannot be empty"));
    }
    create_composite_key(SHIPMENT_OBJECT_TYPE, &[id]).map_err(|e| match e {
        LedgerError::InvalidCompositeKey(detail) => ContractError::validation("shipmentId", detail),
        other => ContractError::Ledger(other),
    })
}

pub(crate) fn decode(record: &KeyValue) -> Option<Shipment> {
    match serde_json::from_slice(&record.value) {
        Ok(shipment) => Some(shipment),
        Err(e) => {
            warn!(key = %record.key.replace('\u{0}', "/"), error = %e, "Skipping undecodable shipment record");
            None
        }
    }
}

impl<'a> ShipmentStore<'a> {
    /// Store bound to the transaction in `ctx`.
    #[must_use]
    pub fn new(ctx: &TxContext<'a>) -> Self {
        Self { stub: ctx.stub() }
    }

    /// Load a shipment if it exists.
    pub fn load(&self, id: &str) -> Result<Option<Shipment>, ContractError> {
        match self.stub.get_state(&shipment_key(id)?)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load a shipment or fail with `NotFound`.
    pub fn require(&self, id: &str) -> Result<Shipment, ContractError> {
        self.load(id)?
            .ok_or_else(|| ContractError::not_found(EntityKind::Shipment, id))
    }

    /// True when a record exists under `id`.
    pub fn exists(&self, id: &str) -> Result<bool, ContractError> {
        Ok(self.stub.get_state(&shipment_key(id)?)?.is_some())
    }

    /// Write a shipment after checking status/payload consistency.
    pub fn save(&self, shipment: &Shipment) -> Result<(), ContractError> {
        check_stage_consistency(shipment)?;
        let bytes = serde_json::to_vec(shipment)?;
        self.stub.put_state(&shipment_key(&shipment.id)?, bytes)?;
        debug!(shipment_id = %shipment.id, status = %shipment.status, "Shipment saved");
        Ok(())
    }

    /// Every shipment in key order.
    pub fn scan_all(&self) -> Result<Vec<Shipment>, ContractError> {
        Ok(self
            .stub
            .state_by_partial_composite_key(SHIPMENT_OBJECT_TYPE, &[])?
            .iter()
            .filter_map(decode)
            .collect())
    }

    /// Raw page of shipment records in key order.
    pub fn scan_page(&self, page_size: u32, bookmark: &str) -> Result<Page, ContractError> {
        Ok(self.stub.state_by_partial_composite_key_paged(
            SHIPMENT_OBJECT_TYPE,
            &[],
            page_size,
            bookmark,
        )?)
    }

    /// Decode the records of a page.
    #[must_use]
    pub fn decode_page(page: &Page) -> Vec<Shipment> {
        page.records.iter().filter_map(decode).collect()
    }

    /// Shipments matching `selector`, one page at a time.
    ///
    /// Without rich-query support the table is scanned in pages of
    /// `page_size` from `bookmark` until `page_size` matches are collected;
    /// the returned bookmark then points at the first unexamined record.
    pub fn query(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(Vec<Shipment>, String), ContractError> {
        match self.stub.query_with_pagination(selector, page_size, bookmark) {
            Ok(page) => Ok((Self::decode_page(&page), page.bookmark)),
            Err(LedgerError::RichQueryUnsupported) => {
                debug!(page_size, "Rich query unsupported, falling back to paged scan");
                self.filtered_scan(selector, page_size, bookmark)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn filtered_scan(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(Vec<Shipment>, String), ContractError> {
        let limit = page_size.max(1) as usize;
        let mut found = Vec::with_capacity(limit);
        let mut cursor = bookmark.to_string();
        loop {
            let page = self.scan_page(page_size.max(1), &cursor)?;
            for record in &page.records {
                if found.len() >= limit {
                    return Ok((found, encode_bookmark(&record.key)));
                }
                if selector.matches_bytes(&record.value) {
                    if let Some(shipment) = decode(record) {
                        found.push(shipment);
                    }
                }
            }
            if page.bookmark.is_empty() {
                return Ok((found, String::new()));
            }
            if found.len() >= limit {
                return Ok((found, page.bookmark));
            }
            cursor = page.bookmark;
        }
    }

    /// Committed versions of a shipment, oldest first.
    ///
    /// Each entry's action is the status of that version (or `DELETED`) and
    /// its actor is the owner recorded in that version.
    pub fn history(&self, id: &str) -> Result<Vec<HistoryEntry>, ContractError> {
        let versions = self.stub.history_for_key(&shipment_key(id)?)?;
        Ok(versions
            .into_iter()
            .map(|m| {
                let value = String::from_utf8_lossy(&m.value).into_owned();
                let doc: Value = serde_json::from_slice(&m.value).unwrap_or(Value::Null);
                let text = |field: &str| {
                    doc.get(field)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                let action = if m.is_delete {
                    "DELETED".to_string()
                } else {
                    text("status")
                };
                HistoryEntry {
                    tx_id: m.tx_id,
                    timestamp: m.timestamp,
                    is_delete: m.is_delete,
                    action,
                    actor_id: text("currentOwnerId"),
                    actor_alias: text("currentOwnerAlias"),
                    value,
                }
            })
            .collect())
    }
}
