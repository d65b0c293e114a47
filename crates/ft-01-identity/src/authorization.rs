//! # Authorization Engine
//!
//! One decision function, [`Authorizer::decide`], answers every role,
//! admin and ownership question. Admin status is consulted first and
//! short-circuits to `Allow`.
//!
//! Designated-recipient checks are deliberately outside `decide`: the next
//! handler of a shipment is a specific party, and administrators do not
//! bypass that.

use shared_ledger::TxContext;
use shared_types::ContractError;
use tracing::{debug, warn};

use crate::directory::IdentityDirectory;
use crate::domain::Role;

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement<'r> {
    /// Caller holds the role.
    Role(Role),
    /// Caller is an administrator.
    Admin,
    /// Caller is the current owner of a shipment.
    OwnerOrAdmin {
        /// Full id of the current owner.
        owner_id: &'r str,
    },
    /// Caller is the named party (e.g. reading their own record).
    SelfOrAdmin {
        /// Full id of the subject.
        subject_id: &'r str,
    },
    /// Caller performed an earlier action (e.g. initiated a recall).
    ActorOrAdmin {
        /// Full id of the earlier actor.
        actor_id: &'r str,
    },
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Access granted.
    Allow {
        /// Why access was granted.
        reason: String,
    },
    /// Access refused.
    Deny {
        /// Why access was refused.
        reason: String,
    },
}

impl AuthDecision {
    /// True for `Allow`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// The decision's reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Allow { reason } | Self::Deny { reason } => reason,
        }
    }
}

/// The next-handler nomination declared by a shipment's previous stage.
#[derive(Debug, Clone, Copy)]
pub struct Designation<'s> {
    /// Shipment being handed over.
    pub shipment_id: &'s str,
    /// Status the shipment is in (the stage that declared the designee).
    pub stage: &'s str,
    /// Designated alias or full id, if the stage declared one.
    pub designee: Option<&'s str>,
}

/// Authorization decisions backed by the identity directory.
#[derive(Debug, Clone, Copy)]
pub struct Authorizer<'d> {
    directory: &'d IdentityDirectory,
}

impl<'d> Authorizer<'d> {
    pub(crate) fn new(directory: &'d IdentityDirectory) -> Self {
        Self { directory }
    }

    /// Decide whether the caller satisfies a requirement.
    ///
    /// # Errors
    ///
    /// Only ledger failures; a refusal is a `Deny`, not an error.
    pub fn decide(
        &self,
        ctx: &TxContext<'_>,
        requirement: &Requirement<'_>,
    ) -> Result<AuthDecision, ContractError> {
        let caller = ctx.caller_id();
        if self.directory.admin_flag_set(ctx, caller)? {
            return Ok(AuthDecision::Allow {
                reason: "caller is an administrator".into(),
            });
        }

        let decision = match *requirement {
            Requirement::Role(role) => match self.directory.load(ctx, caller)? {
                Some(record) if record.has_role(role) => AuthDecision::Allow {
                    reason: format!("caller holds role '{role}'"),
                },
                Some(record) => AuthDecision::Deny {
                    reason: format!(
                        "caller '{}' ({caller}) does not have required role '{role}'",
                        record.alias
                    ),
                },
                None => AuthDecision::Deny {
                    reason: format!("caller '{caller}' is not registered; role '{role}' required"),
                },
            },
            Requirement::Admin => AuthDecision::Deny {
                reason: format!("caller '{caller}' is not an administrator"),
            },
            Requirement::OwnerOrAdmin { owner_id } => {
                if owner_id == caller {
                    AuthDecision::Allow {
                        reason: "caller is the current owner".into(),
                    }
                } else {
                    AuthDecision::Deny {
                        reason: format!(
                            "caller '{caller}' is neither the current owner '{owner_id}' nor an administrator"
                        ),
                    }
                }
            }
            Requirement::SelfOrAdmin { subject_id } => {
                if subject_id == caller {
                    AuthDecision::Allow {
                        reason: "caller is the subject".into(),
                    }
                } else {
                    AuthDecision::Deny {
                        reason: format!(
                            "caller '{caller}' may only access their own record unless administrator"
                        ),
                    }
                }
            }
            Requirement::ActorOrAdmin { actor_id } => {
                if actor_id == caller {
                    AuthDecision::Allow {
                        reason: "caller performed the original action".into(),
                    }
                } else {
                    AuthDecision::Deny {
                        reason: format!(
                            "caller '{caller}' is neither the original actor '{actor_id}' nor an administrator"
                        ),
                    }
                }
            }
        };
        Ok(decision)
    }

    /// Like [`Authorizer::decide`], converting `Deny` into `Unauthorized`.
    pub fn require(
        &self,
        ctx: &TxContext<'_>,
        requirement: &Requirement<'_>,
    ) -> Result<(), ContractError> {
        match self.decide(ctx, requirement)? {
            AuthDecision::Allow { reason } => {
                debug!(caller = %ctx.caller_id(), requirement = ?requirement, reason = %reason, "Authorized");
                Ok(())
            }
            AuthDecision::Deny { reason } => {
                warn!(caller = %ctx.caller_id(), requirement = ?requirement, "Unauthorized request rejected");
                Err(ContractError::Unauthorized(reason))
            }
        }
    }

    /// Require a role; administrators pass unconditionally.
    pub fn require_role(&self, ctx: &TxContext<'_>, role: Role) -> Result<(), ContractError> {
        self.require(ctx, &Requirement::Role(role))
    }

    /// Require administrator status.
    pub fn require_admin(&self, ctx: &TxContext<'_>) -> Result<(), ContractError> {
        self.require(ctx, &Requirement::Admin)
    }

    /// True when the caller is an administrator.
    pub fn caller_is_admin(&self, ctx: &TxContext<'_>) -> Result<bool, ContractError> {
        self.directory.admin_flag_set(ctx, ctx.caller_id())
    }

    /// Require that the caller is the party the previous stage nominated.
    ///
    /// Returns the designee's full id. Administrators get no bypass here.
    ///
    /// # Errors
    ///
    /// - [`ContractError::MissingDesignation`] if no next actor was declared.
    /// - [`ContractError::Unauthorized`] if the caller is someone else.
    pub fn require_designated_recipient(
        &self,
        ctx: &TxContext<'_>,
        designation: &Designation<'_>,
    ) -> Result<String, ContractError> {
        let designee = designation
            .designee
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ContractError::MissingDesignation {
                shipment_id: designation.shipment_id.to_string(),
                stage: designation.stage.to_string(),
            })?;

        let designee_id = self.directory.resolve_id(ctx, designee)?;
        let caller = ctx.caller_id();
        if designee_id == caller {
            return Ok(designee_id);
        }

        let designee_name = self.directory.display_name(ctx, &designee_id)?;
        let caller_name = self.directory.display_name(ctx, caller)?;
        warn!(
            shipment_id = %designation.shipment_id,
            stage = %designation.stage,
            caller = %caller,
            designee = %designee_id,
            "Caller is not the designated recipient"
        );
        Err(ContractError::Unauthorized(format!(
            "caller {caller_name} is not the designated recipient {designee_name} for shipment '{}' in status {}",
            designation.shipment_id, designation.stage
        )))
    }
}
