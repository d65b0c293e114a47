//! The shipment contract: identity directory plus shipment rules.

use ft_01_identity::{Authorizer, IdentityDirectory};
use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::debug;

use crate::config::ContractConfig;
use crate::domain::Shipment;
use crate::store::ShipmentStore;
use crate::validation::Validator;

/// The acting party of an operation, with its display alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Caller full id.
    pub full_id: String,
    /// Registered alias, or a best-effort fallback.
    pub alias: String,
}

/// Pull the common name out of an X.509 full id.
fn common_name(full_id: &str) -> Option<&str> {
    let start = full_id.find("CN=")? + 3;
    let rest = &full_id[start..];
    let end = rest.find([',', ':', '/']).unwrap_or(rest.len());
    let cn = rest[..end].trim();
    (!cn.is_empty()).then_some(cn)
}

/// Supply-chain shipment contract.
///
/// Stateless apart from configuration; all state lives in the ledger reached
/// through the [`TxContext`] of each call.
#[derive(Debug, Clone, Default)]
pub struct FoodtraceContract {
    directory: IdentityDirectory,
    config: ContractConfig,
}

impl FoodtraceContract {
    /// Contract over the given directory and limits.
    #[must_use]
    pub fn new(directory: IdentityDirectory, config: ContractConfig) -> Self {
        Self { directory, config }
    }

    /// The identity directory.
    #[must_use]
    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// Contract limits.
    #[must_use]
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub(crate) fn auth(&self) -> Authorizer<'_> {
        self.directory.authorizer()
    }

    pub(crate) fn validator(&self) -> Validator<'_> {
        Validator::new(&self.config)
    }

    pub(crate) fn store<'a>(&self, ctx: &TxContext<'a>) -> ShipmentStore<'a> {
        ShipmentStore::new(ctx)
    }

    /// Identify the caller.
    ///
    /// The alias comes from the directory, then the certificate CN, then the
    /// enrollment id, and finally a shortened form of the full id.
    pub fn actor(&self, ctx: &TxContext<'_>) -> Result<Actor, ContractError> {
        let full_id = ctx.caller_id().to_string();
        if let Some(alias) = self.directory.alias_of(ctx, &full_id)? {
            return Ok(Actor { full_id, alias });
        }
        let alias = common_name(&full_id)
            .map(str::to_string)
            .or_else(|| {
                ctx.caller()
                    .enrollment_id
                    .clone()
                    .filter(|e| !e.is_empty())
            })
            .unwrap_or_else(|| {
                let short: String = full_id.chars().take(16).collect();
                format!("unknown_{short}")
            });
        debug!(caller = %full_id, alias = %alias, "Caller has no registered alias");
        Ok(Actor { full_id, alias })
    }

    /// Resolve a nominated next handler to `(full id, alias)`.
    pub(crate) fn resolve_party(
        &self,
        ctx: &TxContext<'_>,
        alias_or_id: &str,
    ) -> Result<(String, String), ContractError> {
        let full_id = self.directory.resolve_id(ctx, alias_or_id)?;
        let alias = self.directory.alias_of(ctx, &full_id)?.unwrap_or_default();
        Ok((full_id, alias))
    }

    /// Alias for `full_id`, empty when unknown or on lookup failure.
    pub(crate) fn alias_or_empty(&self, ctx: &TxContext<'_>, full_id: &str) -> String {
        self.directory
            .alias_of(ctx, full_id)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Fill empty alias fields from the directory. Best effort: lookups that
    /// fail leave the field empty.
    pub(crate) fn enrich_aliases(&self, ctx: &TxContext<'_>, shipment: &mut Shipment) {
        let fill = |alias: &mut String, id: &str| {
            if alias.is_empty() && !id.is_empty() {
                *alias = self.alias_or_empty(ctx, id);
            }
        };
        fill(&mut shipment.current_owner_alias, &shipment.current_owner_id);
        if let Some(f) = shipment.farmer_data.as_mut() {
            fill(&mut f.farmer_alias, &f.farmer_id);
        }
        if let Some(p) = shipment.processor_data.as_mut() {
            fill(&mut p.processor_alias, &p.processor_id);
        }
        if let Some(d) = shipment.distributor_data.as_mut() {
            fill(&mut d.distributor_alias, &d.distributor_id);
        }
        if let Some(r) = shipment.retailer_data.as_mut() {
            fill(&mut r.retailer_alias, &r.retailer_id);
        }
        for record in &mut shipment.certification_records {
            fill(&mut record.certifier_alias, &record.certifier_id);
        }
        let recall = &mut shipment.recall_info;
        fill(&mut recall.recalled_by_alias, &recall.recalled_by);
    }
}
