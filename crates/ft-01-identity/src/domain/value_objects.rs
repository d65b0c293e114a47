//! Value objects: roles and storage key namespaces.

use serde::{Deserialize, Serialize};
use shared_types::ContractError;
use std::fmt;
use std::str::FromStr;

/// Object type tag of identity records.
pub const IDENTITY_OBJECT_TYPE: &str = "IdentityInfo";

/// Object type tag of alias -> full id mappings.
pub const ALIAS_OBJECT_TYPE: &str = "Alias";

/// Object type tag of the admin fast-lookup index.
pub const ADMIN_FLAG_OBJECT_TYPE: &str = "AdminFlag";

/// Pseudo-role accepted by role filters to select administrators.
pub const ADMIN_FILTER: &str = "admin";

/// A supply-chain role. Closed set; parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates shipments at origin.
    Farmer,
    /// Processes and transforms shipments.
    Processor,
    /// Moves shipments between processor and retailer.
    Distributor,
    /// Receives and sells shipments.
    Retailer,
    /// Inspects shipments and records certification decisions.
    Certifier,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 5] = [
        Role::Farmer,
        Role::Processor,
        Role::Distributor,
        Role::Retailer,
        Role::Certifier,
    ];

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Processor => "processor",
            Role::Distributor => "distributor",
            Role::Retailer => "retailer",
            Role::Certifier => "certifier",
        }
    }

    fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| {
                ContractError::validation(
                    "role",
                    format!("invalid role '{s}'; valid roles are: {}", Self::valid_list()),
                )
            })
    }
}
