use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PrincipalId, RoleDefinitionId};

/// Identifier of one role assignment in an assignment store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(String);

impl AssignmentId {
    /// Generates a fresh random identifier for a create attempt.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an identifier observed in a store.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Control surface an assignment store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPlane {
    /// Resource administration (Azure RBAC on the account).
    Management,
    /// Document access (SQL role assignments inside the account).
    DataPlane,
}

impl AssignmentPlane {
    /// Returns a stable label for logs and rendering.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Management => "management",
            Self::DataPlane => "data_plane",
        }
    }
}

impl Display for AssignmentPlane {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Binding of a principal to a role definition at a scope, as observed in a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Store-assigned identifier.
    pub assignment_id: AssignmentId,
    /// Principal holding the role.
    pub principal_id: PrincipalId,
    /// Granted role definition.
    pub role_definition_id: RoleDefinitionId,
    /// Resource path the grant applies to.
    pub scope: String,
}

impl RoleAssignment {
    /// Returns the grant this assignment realises.
    #[must_use]
    pub fn grant(&self) -> DesiredGrant {
        DesiredGrant {
            principal_id: self.principal_id.clone(),
            role_definition_id: self.role_definition_id.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Grant a caller wants to exist: the identity of an assignment without its id.
///
/// Two grants are equal only when principal, role definition and scope all
/// match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesiredGrant {
    /// Principal to grant.
    pub principal_id: PrincipalId,
    /// Role definition to grant.
    pub role_definition_id: RoleDefinitionId,
    /// Resource path the grant applies to.
    pub scope: String,
}

impl DesiredGrant {
    /// Creates a desired grant.
    #[must_use]
    pub fn new(
        principal_id: PrincipalId,
        role_definition_id: RoleDefinitionId,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            principal_id,
            role_definition_id,
            scope: scope.into(),
        }
    }

    /// Returns whether an observed assignment realises this grant.
    #[must_use]
    pub fn is_realised_by(&self, assignment: &RoleAssignment) -> bool {
        self.principal_id == assignment.principal_id
            && self.role_definition_id == assignment.role_definition_id
            && self.scope == assignment.scope
    }
}

impl Display for DesiredGrant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{} -> {} @ {}",
            self.principal_id, self.role_definition_id, self.scope
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentId, DesiredGrant, RoleAssignment};
    use crate::{PrincipalId, RoleDefinitionId};

    fn principal(value: &str) -> PrincipalId {
        PrincipalId::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn generated_assignment_ids_are_unique_uuids() {
        let first = AssignmentId::generate();
        let second = AssignmentId::generate();

        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
    }

    #[test]
    fn grant_matching_requires_exact_scope() {
        let grant = DesiredGrant::new(
            principal("p1"),
            RoleDefinitionId::new("role-2"),
            "/accounts/a/dbs/d",
        );
        let observed = RoleAssignment {
            assignment_id: AssignmentId::new("a-1"),
            principal_id: principal("p1"),
            role_definition_id: RoleDefinitionId::new("role-2"),
            scope: "/accounts/a/dbs/d/colls/c".to_owned(),
        };

        assert!(!grant.is_realised_by(&observed));
        assert!(observed.grant().is_realised_by(&observed));
    }
}
