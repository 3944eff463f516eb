use async_trait::async_trait;

use grantctl_core::AppResult;
use grantctl_domain::{AssignmentId, PrincipalId, RoleAssignment, RoleDefinitionId};

/// Database account an assignment store operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Resource group holding the account.
    pub resource_group: String,
    /// Database account name.
    pub account_name: String,
}

impl AccountRef {
    /// Creates an account reference.
    #[must_use]
    pub fn new(resource_group: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            account_name: account_name.into(),
        }
    }
}

/// Input payload for creating one role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssignmentInput {
    /// Scope the assignment applies to.
    pub scope: String,
    /// Caller-generated assignment identifier.
    pub assignment_id: AssignmentId,
    /// Principal to grant.
    pub principal_id: PrincipalId,
    /// Role definition to grant.
    pub role_definition_id: RoleDefinitionId,
}

/// Store port for listing and creating role assignments on one plane.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Lists role assignments for an account, in store order.
    async fn list_assignments(&self, account: &AccountRef) -> AppResult<Vec<RoleAssignment>>;

    /// Creates one role assignment.
    ///
    /// Stores report an existing identical assignment either as
    /// `AppError::Conflict` or with an error message containing "already exists".
    async fn create_assignment(
        &self,
        account: &AccountRef,
        input: CreateAssignmentInput,
    ) -> AppResult<RoleAssignment>;
}
