use grantctl_core::AppResult;
use grantctl_domain::{
    ACCOUNT_READER_ROLE_ID, AssignmentPlane, DATA_CONTRIBUTOR_ROLE_ID, DesiredGrant, PrincipalId,
    RoleDefinitionId, ScopeLevel, ScopePaths,
};
use serde::Serialize;

use crate::{AccountRef, AssignmentReconciler, ReconcileReport};

/// Grants needed for one principal to administer and use the configured account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RbacSetupPlan {
    /// Management-plane grants at account scope.
    pub management: Vec<DesiredGrant>,
    /// Data-plane grants at account, database and container scope.
    pub data_plane: Vec<DesiredGrant>,
}

impl RbacSetupPlan {
    /// Builds the standard plan: account reader on the management plane and
    /// data contributor on every data-plane scope level.
    #[must_use]
    pub fn for_principal(principal_id: &PrincipalId, paths: &ScopePaths) -> Self {
        let management = vec![DesiredGrant::new(
            principal_id.clone(),
            RoleDefinitionId::management_plane(paths.subscription_id(), ACCOUNT_READER_ROLE_ID),
            paths.account(),
        )];

        let contributor = RoleDefinitionId::data_plane(paths.account(), DATA_CONTRIBUTOR_ROLE_ID);
        let data_plane = [ScopeLevel::Account, ScopeLevel::Database, ScopeLevel::Container]
            .into_iter()
            .filter_map(|level| paths.for_level(level))
            .map(|scope| DesiredGrant::new(principal_id.clone(), contributor.clone(), scope))
            .collect();

        Self {
            management,
            data_plane,
        }
    }
}

/// Reports for both planes of a setup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    /// Management-plane report.
    pub management: ReconcileReport,
    /// Data-plane report.
    pub data_plane: ReconcileReport,
}

impl SetupReport {
    /// Returns whether any grant on either plane failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.management.has_failures() || self.data_plane.has_failures()
    }
}

impl AssignmentReconciler {
    /// Applies a setup plan, management plane first.
    pub async fn apply_setup_plan(
        &self,
        account: &AccountRef,
        plan: &RbacSetupPlan,
    ) -> AppResult<SetupReport> {
        let management = self
            .reconcile(AssignmentPlane::Management, account, &plan.management)
            .await?;
        let data_plane = self
            .reconcile(AssignmentPlane::DataPlane, account, &plan.data_plane)
            .await?;

        Ok(SetupReport {
            management,
            data_plane,
        })
    }
}

#[cfg(test)]
mod tests {
    use grantctl_domain::{PrincipalId, ScopeNames, ScopePaths};

    use super::RbacSetupPlan;

    #[test]
    fn setup_plan_covers_every_scope_level() {
        let names = ScopeNames::new("hotels-account", "hotels", "rooms")
            .unwrap_or_else(|_| unreachable!());
        let paths = ScopePaths::new("sub-1", "rg-data", &names).unwrap_or_else(|_| unreachable!());
        let principal = PrincipalId::new("p1").unwrap_or_else(|_| unreachable!());

        let plan = RbacSetupPlan::for_principal(&principal, &paths);

        assert_eq!(plan.management.len(), 1);
        assert_eq!(plan.management[0].scope, paths.account());
        assert!(
            plan.management[0]
                .role_definition_id
                .as_str()
                .contains("Microsoft.Authorization/roleDefinitions/")
        );

        let scopes: Vec<&str> = plan
            .data_plane
            .iter()
            .map(|grant| grant.scope.as_str())
            .collect();
        assert_eq!(
            scopes,
            vec![paths.account(), paths.database(), paths.container()]
        );
        assert!(
            plan.data_plane
                .iter()
                .all(|grant| grant.role_definition_id.as_str().ends_with("000000000002"))
        );
    }
}
