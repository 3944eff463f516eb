//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod arm_authorization_role_assignment_store;
mod arm_client;
mod arm_sql_role_assignment_store;
mod graph_identity_provider;
mod in_memory_assignment_store;
mod in_memory_identity_provider;

pub use arm_authorization_role_assignment_store::{
    ArmAuthorizationRoleAssignmentStore, AUTHORIZATION_API_VERSION,
};
pub use arm_client::{ArmClient, DEFAULT_ARM_BASE_URL};
pub use arm_sql_role_assignment_store::{
    ArmSqlRoleAssignmentStore, SQL_ROLE_ASSIGNMENT_API_VERSION,
};
pub use graph_identity_provider::{DEFAULT_GRAPH_BASE_URL, GraphIdentityProvider};
pub use in_memory_assignment_store::InMemoryAssignmentStore;
pub use in_memory_identity_provider::InMemoryIdentityProvider;
