use async_trait::async_trait;
use grantctl_application::{AccountRef, AssignmentStore, CreateAssignmentInput};
use grantctl_core::{AppError, AppResult};
use grantctl_domain::RoleAssignment;
use tokio::sync::RwLock;

/// In-memory assignment store for one account.
#[derive(Default)]
pub struct InMemoryAssignmentStore {
    assignments: RwLock<Vec<RoleAssignment>>,
    created: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryAssignmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with existing assignments.
    #[must_use]
    pub fn with_assignments(assignments: Vec<RoleAssignment>) -> Self {
        Self {
            assignments: RwLock::new(assignments),
            created: RwLock::new(Vec::new()),
        }
    }

    /// Returns the assignments created through this store, in call order.
    pub async fn created(&self) -> Vec<RoleAssignment> {
        self.created.read().await.clone()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn list_assignments(&self, _account: &AccountRef) -> AppResult<Vec<RoleAssignment>> {
        Ok(self.assignments.read().await.clone())
    }

    async fn create_assignment(
        &self,
        _account: &AccountRef,
        input: CreateAssignmentInput,
    ) -> AppResult<RoleAssignment> {
        let assignment = RoleAssignment {
            assignment_id: input.assignment_id,
            principal_id: input.principal_id,
            role_definition_id: input.role_definition_id,
            scope: input.scope,
        };
        let grant = assignment.grant();

        let mut assignments = self.assignments.write().await;
        if assignments.iter().any(|existing| grant.is_realised_by(existing)) {
            return Err(AppError::Conflict(
                "role assignment already exists".to_owned(),
            ));
        }
        if assignments
            .iter()
            .any(|existing| existing.assignment_id == assignment.assignment_id)
        {
            return Err(AppError::Conflict(format!(
                "assignment id '{}' is already in use",
                assignment.assignment_id
            )));
        }

        assignments.push(assignment.clone());
        self.created.write().await.push(assignment.clone());
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use grantctl_application::{AccountRef, AssignmentStore, CreateAssignmentInput};
    use grantctl_core::AppError;
    use grantctl_domain::{AssignmentId, PrincipalId, RoleAssignment, RoleDefinitionId};

    use super::InMemoryAssignmentStore;

    fn input(id: &str) -> CreateAssignmentInput {
        CreateAssignmentInput {
            scope: "/accounts/a/dbs/d".to_owned(),
            assignment_id: AssignmentId::new(id),
            principal_id: PrincipalId::new("p1").unwrap_or_else(|_| unreachable!()),
            role_definition_id: RoleDefinitionId::new("/accounts/a/sqlRoleDefinitions/r"),
        }
    }

    #[tokio::test]
    async fn created_assignments_are_listed_and_recorded() {
        let store = InMemoryAssignmentStore::new();
        let account = AccountRef::new("rg", "a");

        let created = store.create_assignment(&account, input("a1")).await;
        assert!(created.is_ok());

        let listed = store.list_assignments(&account).await.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.created().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_grant_is_rejected_as_conflict() {
        let store = InMemoryAssignmentStore::new();
        let account = AccountRef::new("rg", "a");

        let first = store.create_assignment(&account, input("a1")).await;
        let second = store.create_assignment(&account, input("a2")).await;

        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(AppError::Conflict(message)) if message == "role assignment already exists"
        ));
        assert_eq!(store.created().await.len(), 1);
    }

    #[tokio::test]
    async fn seeded_assignments_are_not_reported_as_created() {
        let seeded = input("seed");
        let store = InMemoryAssignmentStore::with_assignments(vec![RoleAssignment {
            assignment_id: seeded.assignment_id,
            principal_id: seeded.principal_id,
            role_definition_id: seeded.role_definition_id,
            scope: seeded.scope,
        }]);
        let account = AccountRef::new("rg", "a");

        let duplicate = store.create_assignment(&account, input("a1")).await;

        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        assert_eq!(
            store.list_assignments(&account).await.unwrap_or_default().len(),
            1
        );
        assert!(store.created().await.is_empty());
    }
}
