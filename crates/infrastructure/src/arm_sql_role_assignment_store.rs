use async_trait::async_trait;

use grantctl_application::{AccountRef, AssignmentStore, CreateAssignmentInput};
use grantctl_core::AppResult;
use grantctl_domain::RoleAssignment;
use tracing::debug;

use crate::arm_client::{
    ArmClient, ArmRoleAssignment, ArmRoleAssignmentBody, ArmRoleAssignmentProperties,
};

/// API version for database account data-plane role assignments.
pub const SQL_ROLE_ASSIGNMENT_API_VERSION: &str = "2024-11-15";

/// Data-plane assignment store backed by the database account resource API.
#[derive(Clone)]
pub struct ArmSqlRoleAssignmentStore {
    client: ArmClient,
    subscription_id: String,
}

impl ArmSqlRoleAssignmentStore {
    /// Creates a store for accounts in one subscription.
    #[must_use]
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    fn collection_path(&self, account: &AccountRef) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/{}/sqlRoleAssignments",
            self.subscription_id, account.resource_group, account.account_name
        )
    }
}

#[async_trait]
impl AssignmentStore for ArmSqlRoleAssignmentStore {
    async fn list_assignments(&self, account: &AccountRef) -> AppResult<Vec<RoleAssignment>> {
        let url = self.client.url(
            self.collection_path(account).as_str(),
            &[("api-version", SQL_ROLE_ASSIGNMENT_API_VERSION)],
        )?;

        let resources = self.client.list_all::<ArmRoleAssignment>(url).await?;
        debug!(
            account = %account.account_name,
            count = resources.len(),
            "listed data-plane role assignments"
        );

        Ok(resources
            .into_iter()
            .filter_map(ArmRoleAssignment::into_role_assignment)
            .collect())
    }

    async fn create_assignment(
        &self,
        account: &AccountRef,
        input: CreateAssignmentInput,
    ) -> AppResult<RoleAssignment> {
        let path = format!(
            "{}/{}",
            self.collection_path(account),
            input.assignment_id.as_str()
        );
        let url = self
            .client
            .url(path.as_str(), &[("api-version", SQL_ROLE_ASSIGNMENT_API_VERSION)])?;

        let body = ArmRoleAssignmentBody {
            properties: ArmRoleAssignmentProperties {
                role_definition_id: input.role_definition_id.as_str().to_owned(),
                principal_id: input.principal_id.as_str().to_owned(),
                scope: input.scope.clone(),
            },
        };
        self.client.put_json(url, &body).await?;

        Ok(RoleAssignment {
            assignment_id: input.assignment_id,
            principal_id: input.principal_id,
            role_definition_id: input.role_definition_id,
            scope: input.scope,
        })
    }
}
