//! # Identity Directory Service
//!
//! Maps full ids to aliases, roles and admin status.
//!
//! ## Storage Layout
//!
//! | Object type | Key attribute | Value |
//! |-------------|---------------|-------|
//! | `IdentityInfo` | full id | JSON [`IdentityRecord`] |
//! | `Alias` | alias | full id bytes |
//! | `AdminFlag` | full id | `true` |
//!
//! The admin flag index is authoritative for admin checks; the record's
//! `isAdmin` mirrors it. Promotion and demotion write both, rolling back the
//! record if the index write fails.

use serde_json::json;
use shared_ledger::{create_composite_key, split_composite_key, TxContext};
use shared_types::{ContractError, EntityKind, LedgerError};
use tracing::{error, info, warn};

use crate::authorization::{Authorizer, Requirement};
use crate::config::IdentityConfig;
use crate::domain::{
    AliasDetail, IdentityRecord, Role, RoleCounts, SystemState, ADMIN_FILTER,
    ADMIN_FLAG_OBJECT_TYPE, ALIAS_OBJECT_TYPE, IDENTITY_OBJECT_TYPE,
};
use crate::events::{emit, IdentityEventKind};
use crate::ports::IdentityDirectoryApi;

const ADMIN_FLAG_VALUE: &[u8] = b"true";

/// The identity directory.
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    config: IdentityConfig,
}

fn key(object_type: &str, attribute: &str) -> Result<String, ContractError> {
    create_composite_key(object_type, &[attribute]).map_err(|e| match e {
        LedgerError::InvalidCompositeKey(detail) => ContractError::validation(object_type, detail),
        other => ContractError::Ledger(other),
    })
}

fn printable(key: &str) -> String {
    key.trim_matches('\u{0}').replace('\u{0}', "/")
}

/// Pull the common name out of an X.509 full id for a default alias.
fn common_name(full_id: &str) -> Option<&str> {
    let start = full_id.find("CN=")? + 3;
    let rest = &full_id[start..];
    let end = rest.find([',', ':', '/']).unwrap_or(rest.len());
    let cn = rest[..end].trim();
    (!cn.is_empty()).then_some(cn)
}

impl IdentityDirectory {
    /// Create a directory with the given configuration.
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    /// Directory configuration.
    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Authorization engine over this directory.
    #[must_use]
    pub fn authorizer(&self) -> Authorizer<'_> {
        Authorizer::new(self)
    }

    /// Read the bootstrap gate.
    pub fn system_state(&self, ctx: &TxContext<'_>) -> Result<SystemState, ContractError> {
        let flags = ctx
            .stub()
            .state_by_partial_composite_key(ADMIN_FLAG_OBJECT_TYPE, &[])?;
        Ok(SystemState {
            bootstrapped: !flags.is_empty(),
        })
    }

    /// Resolve an alias or full id to a full id.
    ///
    /// Full ids are returned unchanged without a registration check.
    pub fn resolve_id(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<String, ContractError> {
        let candidate = alias_or_id.trim();
        if candidate.is_empty() {
            return Err(ContractError::validation(
                "identityOrAlias",
                "cannot be empty",
            ));
        }
        if self.config.is_full_id(candidate) {
            return Ok(candidate.to_string());
        }
        self.alias_target(ctx, candidate)?
            .ok_or_else(|| ContractError::not_found(EntityKind::Alias, candidate))
    }

    /// Load a record by full id.
    pub fn load(
        &self,
        ctx: &TxContext<'_>,
        full_id: &str,
    ) -> Result<Option<IdentityRecord>, ContractError> {
        match ctx.stub().get_state(&key(IDENTITY_OBJECT_TYPE, full_id)?)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Alias of a full id, if registered.
    pub fn alias_of(&self, ctx: &TxContext<'_>, full_id: &str) -> Result<Option<String>, ContractError> {
        if full_id.is_empty() {
            return Ok(None);
        }
        Ok(self.load(ctx, full_id)?.map(|r| r.alias))
    }

    /// `alias (full id)` when registered, otherwise the full id.
    pub fn display_name(&self, ctx: &TxContext<'_>, full_id: &str) -> Result<String, ContractError> {
        Ok(match self.alias_of(ctx, full_id)? {
            Some(alias) => format!("'{alias}' ({full_id})"),
            None => format!("'{full_id}'"),
        })
    }

    /// True when the identity holds the role. Unknown identities hold nothing.
    pub fn has_role(
        &self,
        ctx: &TxContext<'_>,
        alias_or_id: &str,
        role: Role,
    ) -> Result<bool, ContractError> {
        let full_id = match self.resolve_id(ctx, alias_or_id) {
            Ok(id) => id,
            Err(ContractError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(self.load(ctx, &full_id)?.is_some_and(|r| r.has_role(role)))
    }

    pub(crate) fn admin_flag_set(&self, ctx: &TxContext<'_>, full_id: &str) -> Result<bool, ContractError> {
        Ok(ctx
            .stub()
            .get_state(&key(ADMIN_FLAG_OBJECT_TYPE, full_id)?)?
            .is_some())
    }

    fn alias_target(&self, ctx: &TxContext<'_>, alias: &str) -> Result<Option<String>, ContractError> {
        match ctx.stub().get_state(&key(ALIAS_OBJECT_TYPE, alias)?)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| ContractError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn store(&self, ctx: &TxContext<'_>, record: &IdentityRecord) -> Result<(), ContractError> {
        ctx.stub().put_state(
            &key(IDENTITY_OBJECT_TYPE, &record.full_id)?,
            serde_json::to_vec(record)?,
        )?;
        Ok(())
    }

    fn require_record(&self, ctx: &TxContext<'_>, full_id: &str) -> Result<IdentityRecord, ContractError> {
        self.load(ctx, full_id)?
            .ok_or_else(|| ContractError::not_found(EntityKind::Identity, full_id))
    }

    fn all_records(&self, ctx: &TxContext<'_>) -> Result<Vec<IdentityRecord>, ContractError> {
        let entries = ctx
            .stub()
            .state_by_partial_composite_key(IDENTITY_OBJECT_TYPE, &[])?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_slice::<IdentityRecord>(&entry.value) {
                Ok(record) => records.push(record),
                Err(e) => warn!(key = %printable(&entry.key), error = %e, "Skipping unreadable identity record"),
            }
        }
        Ok(records)
    }

    fn validate_alias(&self, alias: &str) -> Result<(), ContractError> {
        if alias.is_empty() {
            return Err(ContractError::validation("alias", "cannot be empty"));
        }
        if alias.len() > self.config.max_alias_length {
            return Err(ContractError::validation(
                "alias",
                format!("exceeds max length {}", self.config.max_alias_length),
            ));
        }
        if self.config.is_full_id(alias) {
            return Err(ContractError::validation(
                "alias",
                "must not be shaped like a full id",
            ));
        }
        Ok(())
    }

    /// Restore `previous` under `record_key` after a failed coupled write.
    fn roll_back(
        &self,
        ctx: &TxContext<'_>,
        record_key: &str,
        previous: &IdentityRecord,
        failed_key: &str,
        cause: LedgerError,
    ) -> ContractError {
        let restore = serde_json::to_vec(previous)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
            .and_then(|bytes| ctx.stub().put_state(record_key, bytes));
        match restore {
            Ok(()) => {
                warn!(
                    key = %printable(failed_key),
                    error = %cause,
                    "Admin index write failed; identity record rolled back"
                );
                ContractError::Ledger(cause)
            }
            Err(rollback_error) => {
                error!(
                    key = %printable(record_key),
                    failed_key = %printable(failed_key),
                    error = %cause,
                    rollback_error = %rollback_error,
                    "CRITICAL: admin state inconsistent, rollback failed"
                );
                ContractError::ConsistencyFatal {
                    key: printable(record_key),
                    detail: format!(
                        "write to {} failed ({cause}) and rollback failed ({rollback_error})",
                        printable(failed_key)
                    ),
                }
            }
        }
    }

    fn set_role(
        &self,
        ctx: &TxContext<'_>,
        target: &str,
        role: &str,
        grant: bool,
    ) -> Result<IdentityRecord, ContractError> {
        self.authorizer().require_admin(ctx)?;
        let role: Role = role.parse()?;
        let full_id = self.resolve_id(ctx, target)?;
        let mut record = self.require_record(ctx, &full_id)?;

        if record.has_role(role) == grant {
            info!(role = %role, target = %full_id, grant, "Role already in requested state; no change");
            return Ok(record);
        }

        if grant {
            record.roles.insert(role);
        } else {
            record.roles.remove(&role);
        }
        record.last_updated_at = ctx.tx_timestamp();
        self.store(ctx, &record)?;

        let kind = if grant {
            IdentityEventKind::RoleAssigned
        } else {
            IdentityEventKind::RoleRemoved
        };
        emit(ctx, kind, &full_id, json!({ "role": role.as_str(), "alias": record.alias }))?;
        info!(role = %role, target = %full_id, admin = %ctx.caller_id(), grant, "Role updated");
        Ok(record)
    }
}

impl IdentityDirectoryApi for IdentityDirectory {
    fn register(
        &self,
        ctx: &TxContext<'_>,
        full_id: &str,
        alias: &str,
        enrollment_id: &str,
    ) -> Result<IdentityRecord, ContractError> {
        let state = self.system_state(ctx)?;
        if state.in_bootstrap_mode() {
            warn!(caller = %ctx.caller_id(), "No administrator exists; registering in bootstrap mode");
        } else {
            self.authorizer().require_admin(ctx)?;
        }

        let full_id = full_id.trim();
        let alias = alias.trim();
        if !self.config.is_full_id(full_id) {
            return Err(ContractError::validation(
                "fullId",
                format!("'{full_id}' is not a valid full id"),
            ));
        }
        self.validate_alias(alias)?;

        if let Some(owner) = self.alias_target(ctx, alias)? {
            if owner != full_id {
                return Err(ContractError::Conflict(format!(
                    "alias '{alias}' is already registered to another identity"
                )));
            }
        }

        let now = ctx.tx_timestamp();
        let (record, updated) = match self.load(ctx, full_id)? {
            Some(mut existing) => {
                if existing.alias != alias {
                    ctx.stub().del_state(&key(ALIAS_OBJECT_TYPE, &existing.alias)?)?;
                    info!(full_id = %full_id, old_alias = %existing.alias, new_alias = %alias, "Alias superseded");
                    existing.alias = alias.to_string();
                }
                if !enrollment_id.trim().is_empty() {
                    existing.enrollment_id = enrollment_id.trim().to_string();
                }
                existing.last_updated_at = now;
                (existing, true)
            }
            None => {
                let mut record =
                    IdentityRecord::new(full_id, alias, enrollment_id.trim(), ctx.caller_id(), now);
                if full_id == ctx.caller_id() {
                    record.organization_msp = ctx.caller().msp_id.clone();
                }
                (record, false)
            }
        };

        self.store(ctx, &record)?;
        ctx.stub()
            .put_state(&key(ALIAS_OBJECT_TYPE, alias)?, full_id.as_bytes().to_vec())?;

        emit(
            ctx,
            IdentityEventKind::Registered,
            full_id,
            json!({ "alias": alias, "updated": updated }),
        )?;
        info!(full_id = %full_id, alias = %alias, updated, registered_by = %ctx.caller_id(), "Identity registered");
        Ok(record)
    }

    fn resolve(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<String, ContractError> {
        self.resolve_id(ctx, alias_or_id)
    }

    fn get_info(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<IdentityRecord, ContractError> {
        let full_id = self.resolve_id(ctx, alias_or_id)?;
        self.require_record(ctx, &full_id)
    }

    fn assign_role(
        &self,
        ctx: &TxContext<'_>,
        target: &str,
        role: &str,
    ) -> Result<IdentityRecord, ContractError> {
        self.set_role(ctx, target, role, true)
    }

    fn remove_role(
        &self,
        ctx: &TxContext<'_>,
        target: &str,
        role: &str,
    ) -> Result<IdentityRecord, ContractError> {
        self.set_role(ctx, target, role, false)
    }

    fn make_admin(&self, ctx: &TxContext<'_>, target: &str) -> Result<(), ContractError> {
        let state = self.system_state(ctx)?;
        let full_id = self.resolve_id(ctx, target)?;

        if state.in_bootstrap_mode() {
            if full_id != ctx.caller_id() {
                warn!(caller = %ctx.caller_id(), target = %full_id, "Bootstrap promotion of another identity refused");
                return Err(ContractError::Unauthorized(
                    "while no administrator exists, callers may only promote themselves".into(),
                ));
            }
            warn!(caller = %ctx.caller_id(), "Bootstrap: first administrator self-promoting");
        } else {
            self.authorizer().require_admin(ctx)?;
        }

        let record = self.require_record(ctx, &full_id)?;
        let flag_key = key(ADMIN_FLAG_OBJECT_TYPE, &full_id)?;
        let flag_set = ctx.stub().get_state(&flag_key)?.is_some();
        if record.is_admin && flag_set {
            info!(target = %full_id, "Identity is already an administrator; no change");
            return Ok(());
        }

        let record_key = key(IDENTITY_OBJECT_TYPE, &full_id)?;
        let mut promoted = record.clone();
        promoted.is_admin = true;
        promoted.last_updated_at = ctx.tx_timestamp();
        self.store(ctx, &promoted)?;

        if let Err(cause) = ctx.stub().put_state(&flag_key, ADMIN_FLAG_VALUE.to_vec()) {
            return Err(self.roll_back(ctx, &record_key, &record, &flag_key, cause));
        }

        emit(ctx, IdentityEventKind::AdminGranted, &full_id, json!({ "alias": record.alias }))?;
        info!(target = %full_id, by = %ctx.caller_id(), "Administrator granted");
        Ok(())
    }

    fn remove_admin(&self, ctx: &TxContext<'_>, target: &str) -> Result<(), ContractError> {
        self.authorizer().require_admin(ctx)?;
        let full_id = self.resolve_id(ctx, target)?;
        if full_id == ctx.caller_id() {
            warn!(caller = %full_id, "Self-demotion refused");
            return Err(ContractError::Unauthorized(
                "administrators cannot remove their own admin status".into(),
            ));
        }

        let flag_key = key(ADMIN_FLAG_OBJECT_TYPE, &full_id)?;
        let flag_set = ctx.stub().get_state(&flag_key)?.is_some();

        let Some(record) = self.load(ctx, &full_id)? else {
            if flag_set {
                warn!(target = %full_id, "Removing orphaned admin flag of unregistered identity");
                ctx.stub().del_state(&flag_key)?;
                return Ok(());
            }
            return Err(ContractError::not_found(EntityKind::Identity, full_id));
        };

        if !record.is_admin {
            if flag_set {
                warn!(target = %full_id, "Clearing stale admin flag");
                ctx.stub().del_state(&flag_key)?;
            }
            return Ok(());
        }

        let record_key = key(IDENTITY_OBJECT_TYPE, &full_id)?;
        let mut demoted = record.clone();
        demoted.is_admin = false;
        demoted.last_updated_at = ctx.tx_timestamp();
        self.store(ctx, &demoted)?;

        if let Err(cause) = ctx.stub().del_state(&flag_key) {
            return Err(self.roll_back(ctx, &record_key, &record, &flag_key, cause));
        }

        emit(ctx, IdentityEventKind::AdminRevoked, &full_id, json!({ "alias": record.alias }))?;
        info!(target = %full_id, by = %ctx.caller_id(), "Administrator revoked");
        Ok(())
    }

    fn any_admin_exists(&self, ctx: &TxContext<'_>) -> Result<bool, ContractError> {
        Ok(self.system_state(ctx)?.bootstrapped)
    }

    fn is_admin(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<bool, ContractError> {
        let full_id = self.resolve_id(ctx, alias_or_id)?;
        self.admin_flag_set(ctx, &full_id)
    }

    fn list_all(&self, ctx: &TxContext<'_>) -> Result<Vec<IdentityRecord>, ContractError> {
        self.authorizer().require_admin(ctx)?;
        self.all_records(ctx)
    }

    fn identity_details(
        &self,
        ctx: &TxContext<'_>,
        alias_or_id: &str,
    ) -> Result<IdentityRecord, ContractError> {
        let full_id = self.resolve_id(ctx, alias_or_id)?;
        self.authorizer()
            .require(ctx, &Requirement::SelfOrAdmin { subject_id: &full_id })?;
        self.require_record(ctx, &full_id)
    }

    fn list_aliases(&self, ctx: &TxContext<'_>) -> Result<Vec<String>, ContractError> {
        let entries = ctx
            .stub()
            .state_by_partial_composite_key(ALIAS_OBJECT_TYPE, &[])?;
        Ok(entries
            .iter()
            .filter_map(|e| split_composite_key(&e.key))
            .filter_map(|(_, mut attrs)| attrs.pop())
            .collect())
    }

    fn alias_details(&self, ctx: &TxContext<'_>) -> Result<Vec<AliasDetail>, ContractError> {
        let mut details: Vec<AliasDetail> =
            self.all_records(ctx)?.iter().map(AliasDetail::from).collect();
        details.sort_by(|a, b| a.alias.cmp(&b.alias));
        Ok(details)
    }

    fn aliases_by_role(
        &self,
        ctx: &TxContext<'_>,
        role_filter: &str,
    ) -> Result<Vec<String>, ContractError> {
        let records = self.all_records(ctx)?;
        let mut aliases: Vec<String> = if role_filter.trim().eq_ignore_ascii_case(ADMIN_FILTER) {
            records
                .into_iter()
                .filter(|r| r.is_admin)
                .map(|r| r.alias)
                .collect()
        } else {
            let role: Role = role_filter.parse()?;
            records
                .into_iter()
                .filter(|r| r.has_role(role))
                .map(|r| r.alias)
                .collect()
        };
        aliases.sort();
        Ok(aliases)
    }

    fn roles_with_counts(&self, ctx: &TxContext<'_>) -> Result<RoleCounts, ContractError> {
        let records = self.all_records(ctx)?;
        let mut counts = RoleCounts {
            total: records.len(),
            ..RoleCounts::default()
        };
        for role in Role::ALL {
            counts.roles.insert(role.as_str().to_string(), 0);
        }
        for record in &records {
            for role in &record.roles {
                *counts.roles.entry(role.as_str().to_string()).or_default() += 1;
            }
            if record.is_admin {
                counts.admin += 1;
            }
        }
        Ok(counts)
    }

    fn full_id_for_alias(&self, ctx: &TxContext<'_>, alias: &str) -> Result<String, ContractError> {
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(ContractError::validation("alias", "cannot be empty"));
        }
        self.alias_target(ctx, alias)?
            .ok_or_else(|| ContractError::not_found(EntityKind::Alias, alias))
    }

    fn bootstrap_ledger(&self, ctx: &TxContext<'_>) -> Result<IdentityRecord, ContractError> {
        if self.system_state(ctx)?.bootstrapped {
            return Err(ContractError::Conflict(
                "system already has admins or is bootstrapped".into(),
            ));
        }

        let caller = ctx.caller_id();
        if !self.config.is_full_id(caller) {
            return Err(ContractError::validation(
                "caller",
                format!("'{caller}' is not a valid full id"),
            ));
        }
        let now = ctx.tx_timestamp();
        let mut record = match self.load(ctx, caller)? {
            Some(existing) => existing,
            None => {
                let alias = common_name(caller).unwrap_or("admin");
                if self.alias_target(ctx, alias)?.is_some_and(|owner| owner != caller) {
                    return Err(ContractError::Conflict(format!(
                        "alias '{alias}' is already registered to another identity"
                    )));
                }
                let mut record = IdentityRecord::new(
                    caller,
                    alias,
                    ctx.caller().enrollment_id.as_deref().unwrap_or_default(),
                    caller,
                    now,
                );
                record.organization_msp = ctx.caller().msp_id.clone();
                record
            }
        };
        record.is_admin = true;
        record.last_updated_at = now;

        self.store(ctx, &record)?;
        ctx.stub()
            .put_state(&key(ALIAS_OBJECT_TYPE, &record.alias)?, caller.as_bytes().to_vec())?;
        ctx.stub()
            .put_state(&key(ADMIN_FLAG_OBJECT_TYPE, caller)?, ADMIN_FLAG_VALUE.to_vec())?;

        emit(ctx, IdentityEventKind::LedgerBootstrapped, caller, json!({ "alias": record.alias }))?;
        info!(admin = %caller, alias = %record.alias, "Ledger bootstrapped");
        Ok(record)
    }
}
