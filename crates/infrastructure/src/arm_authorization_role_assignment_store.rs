use async_trait::async_trait;

use grantctl_application::{AccountRef, AssignmentStore, CreateAssignmentInput};
use grantctl_core::AppResult;
use grantctl_domain::RoleAssignment;
use tracing::debug;

use crate::arm_client::{
    ArmClient, ArmRoleAssignment, ArmRoleAssignmentBody, ArmRoleAssignmentProperties,
};

/// API version for management-plane role assignments.
pub const AUTHORIZATION_API_VERSION: &str = "2022-04-01";

/// Management-plane assignment store backed by the authorization resource API.
///
/// Listing is limited to assignments that apply at the account scope.
#[derive(Clone)]
pub struct ArmAuthorizationRoleAssignmentStore {
    client: ArmClient,
    subscription_id: String,
}

impl ArmAuthorizationRoleAssignmentStore {
    /// Creates a store for accounts in one subscription.
    #[must_use]
    pub fn new(client: ArmClient, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    fn account_scope(&self, account: &AccountRef) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/{}",
            self.subscription_id, account.resource_group, account.account_name
        )
    }
}

#[async_trait]
impl AssignmentStore for ArmAuthorizationRoleAssignmentStore {
    async fn list_assignments(&self, account: &AccountRef) -> AppResult<Vec<RoleAssignment>> {
        let path = format!(
            "{}/providers/Microsoft.Authorization/roleAssignments",
            self.account_scope(account)
        );
        let url = self.client.url(
            path.as_str(),
            &[
                ("api-version", AUTHORIZATION_API_VERSION),
                ("$filter", "atScope()"),
            ],
        )?;

        let resources = self.client.list_all::<ArmRoleAssignment>(url).await?;
        debug!(
            account = %account.account_name,
            count = resources.len(),
            "listed management-plane role assignments"
        );

        Ok(resources
            .into_iter()
            .filter_map(ArmRoleAssignment::into_role_assignment)
            .collect())
    }

    async fn create_assignment(
        &self,
        _account: &AccountRef,
        input: CreateAssignmentInput,
    ) -> AppResult<RoleAssignment> {
        let path = format!(
            "{}/providers/Microsoft.Authorization/roleAssignments/{}",
            input.scope.trim_end_matches('/'),
            input.assignment_id.as_str()
        );
        let url = self
            .client
            .url(path.as_str(), &[("api-version", AUTHORIZATION_API_VERSION)])?;

        // The scope is carried by the request path.
        let body = ArmRoleAssignmentBody {
            properties: ArmRoleAssignmentProperties {
                role_definition_id: input.role_definition_id.as_str().to_owned(),
                principal_id: input.principal_id.as_str().to_owned(),
                scope: String::new(),
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

#[cfg(test)]
mod tests {
    use grantctl_application::AccountRef;

    use crate::arm_client::{ArmClient, ArmRoleAssignmentBody, ArmRoleAssignmentProperties};

    use super::ArmAuthorizationRoleAssignmentStore;

    #[test]
    fn account_scope_matches_resource_path() {
        let store = ArmAuthorizationRoleAssignmentStore::new(
            ArmClient::new(reqwest::Client::new(), "https://management.test", "token"),
            "sub-1",
        );

        assert_eq!(
            store.account_scope(&AccountRef::new("rg-data", "hotels-account")),
            "/subscriptions/sub-1/resourceGroups/rg-data/providers/Microsoft.DocumentDB/databaseAccounts/hotels-account"
        );
    }

    #[test]
    fn create_body_omits_empty_scope() {
        let body = ArmRoleAssignmentBody {
            properties: ArmRoleAssignmentProperties {
                role_definition_id: "/r".to_owned(),
                principal_id: "p1".to_owned(),
                scope: String::new(),
            },
        };

        let value = serde_json::to_value(&body).unwrap_or_default();

        assert_eq!(
            value,
            serde_json::json!({
                "properties": { "roleDefinitionId": "/r", "principalId": "p1" }
            })
        );
    }
}
