use std::collections::HashMap;

use grantctl_core::AppResult;
use grantctl_domain::{
    AssignmentId, PrincipalId, PrincipalInfo, RoleAssignment, RoleCatalog, RoleDefinitionId,
    ScopeLevel, ScopeNames,
};
use serde::Serialize;

use crate::{AccountRef, AssignmentStore, IdentityResolver};

/// One principal holding a grouped role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMember {
    /// Principal identifier.
    pub principal_id: PrincipalId,
    /// Resolved directory details.
    pub principal: PrincipalInfo,
    /// Assignment that first granted the role to this principal.
    pub assignment_id: AssignmentId,
}

/// Assignments of one role at one scope, with deduplicated members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedRole {
    /// Display name from the role catalog.
    pub role_name: String,
    /// Classified level of `scope`.
    pub scope_level: ScopeLevel,
    /// Concrete scope path.
    pub scope: String,
    /// Role definition of the first assignment seen for this group.
    pub role_definition_id: RoleDefinitionId,
    /// Members in first-seen order, at most one per principal.
    pub members: Vec<RoleMember>,
}

impl GroupedRole {
    fn contains_principal(&self, principal_id: &PrincipalId) -> bool {
        self.members
            .iter()
            .any(|member| &member.principal_id == principal_id)
    }
}

/// Application service that turns observed assignments into a grouped report.
#[derive(Debug, Clone)]
pub struct AssignmentReportService {
    catalog: RoleCatalog,
    names: ScopeNames,
}

impl AssignmentReportService {
    /// Creates a report service for the configured account, database and container.
    #[must_use]
    pub fn new(catalog: RoleCatalog, names: ScopeNames) -> Self {
        Self { catalog, names }
    }

    /// Groups observed assignments by role name, scope level and scope.
    ///
    /// Groups keep the first-seen order of their keys in `observed`. Principal
    /// lookups may complete in any order; they are resolved up front and merged
    /// in input order.
    pub async fn report(
        &self,
        observed: &[RoleAssignment],
        resolver: &IdentityResolver,
    ) -> Vec<GroupedRole> {
        let principal_ids: Vec<PrincipalId> = observed
            .iter()
            .map(|assignment| assignment.principal_id.clone())
            .collect();
        let principals = resolver.resolve_all(&principal_ids).await;

        let mut groups: Vec<GroupedRole> = Vec::new();
        let mut positions: HashMap<(String, ScopeLevel, String), usize> = HashMap::new();

        for assignment in observed {
            let role_name = self
                .catalog
                .role_name(&assignment.role_definition_id)
                .to_owned();
            let scope_level = self.names.classify(assignment.scope.as_str());
            let key = (role_name, scope_level, assignment.scope.clone());

            let position = match positions.get(&key) {
                Some(position) => *position,
                None => {
                    groups.push(GroupedRole {
                        role_name: key.0.clone(),
                        scope_level,
                        scope: assignment.scope.clone(),
                        role_definition_id: assignment.role_definition_id.clone(),
                        members: Vec::new(),
                    });
                    positions.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };

            let group = &mut groups[position];
            if group.contains_principal(&assignment.principal_id) {
                continue;
            }

            let principal = principals
                .get(&assignment.principal_id)
                .cloned()
                .unwrap_or_else(PrincipalInfo::not_found);
            group.members.push(RoleMember {
                principal_id: assignment.principal_id.clone(),
                principal,
                assignment_id: assignment.assignment_id.clone(),
            });
        }

        groups
    }

    /// Lists assignments from a store and groups them.
    ///
    /// A failing listing aborts the report; per-principal lookup failures do not.
    pub async fn report_from_store(
        &self,
        store: &dyn AssignmentStore,
        account: &AccountRef,
        resolver: &IdentityResolver,
    ) -> AppResult<Vec<GroupedRole>> {
        let observed = store.list_assignments(account).await?;
        Ok(self.report(&observed, resolver).await)
    }
}
