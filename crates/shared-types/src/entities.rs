//! # Core Entities
//!
//! Identity and pagination primitives shared by every contract crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The verified identity of the invoking party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Stable, unforgeable identifier assigned by the trust infrastructure.
    pub full_id: String,
    /// Membership service provider of the caller's organization.
    #[serde(default)]
    pub msp_id: String,
    /// Enrollment id from the certificate authority, when known.
    #[serde(default)]
    pub enrollment_id: Option<String>,
}

impl CallerIdentity {
    /// Construct a caller with only a full id.
    pub fn new(full_id: impl Into<String>) -> Self {
        Self {
            full_id: full_id.into(),
            msp_id: String::new(),
            enrollment_id: None,
        }
    }

    /// Attach the organization MSP id.
    #[must_use]
    pub fn with_msp(mut self, msp_id: impl Into<String>) -> Self {
        self.msp_id = msp_id.into();
        self
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_id)
    }
}

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A shipment record.
    Shipment,
    /// An identity record, looked up by full id.
    Identity,
    /// An alias mapping.
    Alias,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Shipment => f.write_str("shipment"),
            EntityKind::Identity => f.write_str("identity"),
            EntityKind::Alias => f.write_str("alias"),
        }
    }
}

/// A caller-supplied page request. The page size is untrusted and always
/// passed through [`PageRequest::effective_size`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Requested page size; `None` or `0` selects the default.
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Opaque continuation bookmark; empty means "from the start".
    #[serde(default)]
    pub bookmark: String,
}

impl PageRequest {
    /// First page with the given size.
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            bookmark: String::new(),
        }
    }

    /// Continue from a bookmark.
    #[must_use]
    pub fn after(mut self, bookmark: impl Into<String>) -> Self {
        self.bookmark = bookmark.into();
        self
    }

    /// Parse the loosely typed `(pageSize, bookmark)` pair a gateway sends.
    /// Unparseable sizes fall back to the default.
    pub fn from_raw(page_size: &str, bookmark: &str) -> Self {
        Self {
            page_size: page_size.trim().parse().ok(),
            bookmark: bookmark.to_string(),
        }
    }

    /// Page size after defaulting and clamping to `1..=max`.
    #[must_use]
    pub fn effective_size(&self, default: u32, max: u32) -> u32 {
        match self.page_size {
            None | Some(0) => default.clamp(1, max.max(1)),
            Some(n) => n.clamp(1, max.max(1)),
        }
    }
}
