//! Identity entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::value_objects::{Role, IDENTITY_OBJECT_TYPE};

/// A registered participant.
///
/// `full_id` is immutable. `alias`, `roles` and `is_admin` change only through
/// directory operations; records are superseded, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Always [`IDENTITY_OBJECT_TYPE`].
    pub object_type: String,
    /// Stable identifier assigned by the trust infrastructure.
    pub full_id: String,
    /// Unique human-chosen short name.
    pub alias: String,
    /// Certificate authority enrollment id.
    #[serde(default)]
    pub enrollment_id: String,
    /// Organization MSP, when registered by the identity itself.
    #[serde(default)]
    pub organization_msp: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Mirrors the admin flag index; the index is authoritative.
    #[serde(default)]
    pub is_admin: bool,
    /// Full id of the registering party.
    pub registered_by: String,
    /// Registration transaction time.
    pub registered_at: DateTime<Utc>,
    /// Last mutation transaction time.
    pub last_updated_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// A fresh record with no roles.
    #[must_use]
    pub fn new(
        full_id: &str,
        alias: &str,
        enrollment_id: &str,
        registered_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            object_type: IDENTITY_OBJECT_TYPE.to_string(),
            full_id: full_id.to_string(),
            alias: alias.to_string(),
            enrollment_id: enrollment_id.to_string(),
            organization_msp: String::new(),
            roles: BTreeSet::new(),
            is_admin: false,
            registered_by: registered_by.to_string(),
            registered_at: now,
            last_updated_at: now,
        }
    }

    /// True when the role is held.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The bootstrap gate: whether any administrator exists yet.
///
/// Loaded from the admin flag index at the start of `register` and
/// `make_admin`; never cached across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemState {
    /// True once at least one admin flag is present.
    pub bootstrapped: bool,
}

impl SystemState {
    /// True while anyone may register and self-promote.
    #[must_use]
    pub fn in_bootstrap_mode(&self) -> bool {
        !self.bootstrapped
    }
}

/// Role census returned by `roles_with_counts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCounts {
    /// Identities per role.
    pub roles: BTreeMap<String, usize>,
    /// Identities flagged admin.
    pub admin: usize,
    /// Registered identities.
    pub total: usize,
}

/// Alias listing entry with role detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasDetail {
    /// Alias.
    pub alias: String,
    /// Full id behind the alias.
    pub full_id: String,
    /// Granted roles.
    pub roles: BTreeSet<Role>,
    /// Admin status.
    pub is_admin: bool,
}

impl From<&IdentityRecord> for AliasDetail {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            alias: record.alias.clone(),
            full_id: record.full_id.clone(),
            roles: record.roles.clone(),
            is_admin: record.is_admin,
        }
    }
}
