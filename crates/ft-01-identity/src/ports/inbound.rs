//! Inbound port: the identity directory API exposed to the gateway.

use shared_ledger::TxContext;
use shared_types::ContractError;

use crate::domain::{AliasDetail, IdentityRecord, RoleCounts};

/// Primary API of the identity directory.
///
/// Every method runs inside the caller's transaction; the caller is taken
/// from the context, never from arguments.
pub trait IdentityDirectoryApi {
    /// Register a participant, or update alias/enrollment of a known one.
    ///
    /// Open to anyone until the first admin exists; admin-only afterwards.
    fn register(
        &self,
        ctx: &TxContext<'_>,
        full_id: &str,
        alias: &str,
        enrollment_id: &str,
    ) -> Result<IdentityRecord, ContractError>;

    /// Resolve an alias or full id to a full id.
    fn resolve(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<String, ContractError>;

    /// Load the record behind an alias or full id.
    fn get_info(
        &self,
        ctx: &TxContext<'_>,
        alias_or_id: &str,
    ) -> Result<IdentityRecord, ContractError>;

    /// Grant a role. Admin-only, idempotent.
    fn assign_role(
        &self,
        ctx: &TxContext<'_>,
        target: &str,
        role: &str,
    ) -> Result<IdentityRecord, ContractError>;

    /// Revoke a role. Admin-only, idempotent.
    fn remove_role(
        &self,
        ctx: &TxContext<'_>,
        target: &str,
        role: &str,
    ) -> Result<IdentityRecord, ContractError>;

    /// Promote to admin. Admin-only, except for bootstrap self-promotion.
    fn make_admin(&self, ctx: &TxContext<'_>, target: &str) -> Result<(), ContractError>;

    /// Demote an admin. Admin-only; never applicable to the caller.
    fn remove_admin(&self, ctx: &TxContext<'_>, target: &str) -> Result<(), ContractError>;

    /// True when the admin flag index has any entry.
    fn any_admin_exists(&self, ctx: &TxContext<'_>) -> Result<bool, ContractError>;

    /// True when the identity carries the admin flag.
    fn is_admin(&self, ctx: &TxContext<'_>, alias_or_id: &str) -> Result<bool, ContractError>;

    /// Every registered identity. Admin-only.
    fn list_all(&self, ctx: &TxContext<'_>) -> Result<Vec<IdentityRecord>, ContractError>;

    /// One identity's record. Admin or the identity itself.
    fn identity_details(
        &self,
        ctx: &TxContext<'_>,
        alias_or_id: &str,
    ) -> Result<IdentityRecord, ContractError>;

    /// Every registered alias, sorted.
    fn list_aliases(&self, ctx: &TxContext<'_>) -> Result<Vec<String>, ContractError>;

    /// Every alias with roles and admin status.
    fn alias_details(&self, ctx: &TxContext<'_>) -> Result<Vec<AliasDetail>, ContractError>;

    /// Aliases holding a role, or `"admin"` for administrators.
    fn aliases_by_role(
        &self,
        ctx: &TxContext<'_>,
        role_filter: &str,
    ) -> Result<Vec<String>, ContractError>;

    /// Identity counts per role.
    fn roles_with_counts(&self, ctx: &TxContext<'_>) -> Result<RoleCounts, ContractError>;

    /// Full id mapped to an alias. Does not accept full ids.
    fn full_id_for_alias(&self, ctx: &TxContext<'_>, alias: &str) -> Result<String, ContractError>;

    /// Register the caller as the first administrator.
    fn bootstrap_ledger(&self, ctx: &TxContext<'_>) -> Result<IdentityRecord, ContractError>;
}
