//! # Identity Directory & Authorization Engine
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Maps every participant's full id (the stable identifier issued by the
//! trust infrastructure) to a unique alias, a set of roles and an admin flag,
//! and answers the authorization questions every shipment operation asks.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Aliases are unique | `directory.rs` - `register()` conflict check |
//! | Registration is admin-only once an admin exists | `directory.rs` - bootstrap gate |
//! | Admin flag index and record agree | `directory.rs` - `roll_back()` |
//! | Nobody demotes themselves | `directory.rs` - `remove_admin()` |
//! | Admins never bypass designated-recipient checks | `authorization.rs` |
//!
//! ## Bootstrap
//!
//! ```text
//! [no admin] ──register(anyone)──→ [no admin] ──make_admin(self)──→ [bootstrapped]
//!      │                                                                  ↑
//!      └──────────────────────── bootstrap_ledger(caller) ────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! ports/inbound.rs   - IdentityDirectoryApi trait
//! directory.rs       - IdentityDirectory (implements the API)
//! authorization.rs   - Authorizer, Requirement, Designation
//! domain/            - IdentityRecord, Role, SystemState
//! events.rs          - identity ledger events
//! config.rs          - IdentityConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod authorization;
pub mod config;
pub mod directory;
pub mod domain;
pub mod events;
pub mod ports;

pub use authorization::{AuthDecision, Authorizer, Designation, Requirement};
pub use config::IdentityConfig;
pub use directory::IdentityDirectory;
pub use domain::*;
pub use events::IdentityEventKind;
pub use ports::IdentityDirectoryApi;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem identifier.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Identity Directory";

/// Common imports for callers of the directory.
pub mod prelude {
    pub use crate::authorization::{Authorizer, Designation, Requirement};
    pub use crate::directory::IdentityDirectory;
    pub use crate::domain::{IdentityRecord, Role};
    pub use crate::ports::IdentityDirectoryApi;
}
