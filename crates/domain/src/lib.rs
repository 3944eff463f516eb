//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod principal;
mod role;
mod scope;

pub use assignment::{AssignmentId, AssignmentPlane, DesiredGrant, RoleAssignment};
pub use principal::{PRINCIPAL_NOT_FOUND, PrincipalId, PrincipalInfo, PrincipalKind};
pub use role::{
    ACCOUNT_READER_ROLE_ID, ACCOUNT_READER_ROLE_NAME, CUSTOM_ROLE_NAME, DATA_CONTRIBUTOR_ROLE_ID,
    DATA_CONTRIBUTOR_ROLE_NAME, DATA_READER_ROLE_ID, DATA_READER_ROLE_NAME, RoleCatalog,
    RoleDefinitionId,
};
pub use scope::{ScopeLevel, ScopeNames, ScopePaths};
