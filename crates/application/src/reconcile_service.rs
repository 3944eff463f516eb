use std::collections::HashSet;
use std::sync::Arc;

use grantctl_core::{AppError, AppResult};
use grantctl_domain::{AssignmentId, AssignmentPlane, DesiredGrant, RoleAssignment};
use serde::Serialize;
use tracing::{info, warn};

use crate::{AccountRef, AssignmentStore, CreateAssignmentInput};

/// Split of desired grants into those to create and those already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrantPlan {
    /// Desired grants with no matching observed assignment.
    pub to_create: Vec<DesiredGrant>,
    /// Desired grants an observed assignment already realises.
    pub already_present: Vec<DesiredGrant>,
}

/// Compares desired grants against observed assignments.
///
/// Matching is exact on principal, role definition and scope. Duplicate desired
/// grants collapse into one, keeping first-seen order.
#[must_use]
pub fn plan_grants(desired: &[DesiredGrant], observed: &[RoleAssignment]) -> GrantPlan {
    let present: HashSet<DesiredGrant> = observed.iter().map(RoleAssignment::grant).collect();
    let mut seen = HashSet::new();
    let mut plan = GrantPlan::default();

    for grant in desired {
        if !seen.insert(grant) {
            continue;
        }
        if present.contains(grant) {
            plan.already_present.push(grant.clone());
        } else {
            plan.to_create.push(grant.clone());
        }
    }

    plan
}

/// Result of applying one desired grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GrantOutcome {
    /// The store created a new assignment.
    Created {
        /// Identifier used for the new assignment.
        assignment_id: AssignmentId,
    },
    /// An observed assignment already realised the grant; nothing was sent.
    AlreadyPresent,
    /// The store reported the assignment as existing when creating it.
    AlreadyExists,
    /// The create call failed.
    Failed {
        /// Error reported by the store.
        reason: String,
    },
}

impl GrantOutcome {
    /// Returns whether the grant holds after the run.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Outcome for one desired grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantResult {
    /// Desired grant.
    pub grant: DesiredGrant,
    /// What happened to it.
    pub outcome: GrantOutcome,
}

/// Per-plane reconciliation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Plane the grants were applied to.
    pub plane: AssignmentPlane,
    /// Plan computed from the observed assignments.
    pub plan: GrantPlan,
    /// One result per distinct desired grant, present grants first.
    pub results: Vec<GrantResult>,
    /// Set when the plane's assignments could not be listed; every grant then failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
}

impl ReconcileReport {
    /// Counts results with a matching outcome.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&GrantOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| predicate(&result.outcome))
            .count()
    }

    /// Returns the results whose create call failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&GrantResult> {
        self.results
            .iter()
            .filter(|result| !result.outcome.is_success())
            .collect()
    }

    /// Returns whether listing failed or any grant failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.listing_error.is_some()
            || self
                .results
                .iter()
                .any(|result| !result.outcome.is_success())
    }
}

/// Returns whether a create failure means the assignment is already there.
///
/// Only the message decides: a conflict can also mean another operation holds
/// the resource, which is a real failure.
#[must_use]
pub fn is_already_exists(error: &AppError) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    message.contains("already exists") || message.contains("roleassignmentexists")
}

/// Assignment stores for both planes.
#[derive(Clone)]
pub struct AssignmentStores {
    /// Management-plane store.
    pub management: Arc<dyn AssignmentStore>,
    /// Data-plane store.
    pub data_plane: Arc<dyn AssignmentStore>,
}

/// Application service that drives assignment stores toward desired grants.
#[derive(Clone)]
pub struct AssignmentReconciler {
    stores: AssignmentStores,
}

impl AssignmentReconciler {
    /// Creates a reconciler over both planes.
    #[must_use]
    pub fn new(stores: AssignmentStores) -> Self {
        Self { stores }
    }

    fn store(&self, plane: AssignmentPlane) -> &dyn AssignmentStore {
        match plane {
            AssignmentPlane::Management => self.stores.management.as_ref(),
            AssignmentPlane::DataPlane => self.stores.data_plane.as_ref(),
        }
    }

    /// Reconciles one plane.
    ///
    /// Only an unreachable store aborts. Any other listing failure marks every
    /// grant on this plane as failed; each create failure is recorded in the
    /// report and the remaining grants are still processed.
    pub async fn reconcile(
        &self,
        plane: AssignmentPlane,
        account: &AccountRef,
        desired: &[DesiredGrant],
    ) -> AppResult<ReconcileReport> {
        let store = self.store(plane);
        let observed = match store.list_assignments(account).await {
            Ok(observed) => observed,
            Err(error @ AppError::Unavailable(_)) => return Err(error),
            Err(error) => {
                warn!(
                    plane = %plane,
                    error = %error,
                    "failed to list role assignments, skipping plane"
                );
                return Ok(listing_failed_report(plane, desired, &error));
            }
        };
        let plan = plan_grants(desired, &observed);

        let mut results: Vec<GrantResult> = plan
            .already_present
            .iter()
            .map(|grant| GrantResult {
                grant: grant.clone(),
                outcome: GrantOutcome::AlreadyPresent,
            })
            .collect();

        for grant in &plan.to_create {
            let outcome = create_grant(store, plane, account, grant).await;
            results.push(GrantResult {
                grant: grant.clone(),
                outcome,
            });
        }

        Ok(ReconcileReport {
            plane,
            plan,
            results,
            listing_error: None,
        })
    }
}

fn listing_failed_report(
    plane: AssignmentPlane,
    desired: &[DesiredGrant],
    error: &AppError,
) -> ReconcileReport {
    let plan = plan_grants(desired, &[]);
    let reason = format!("could not list existing role assignments: {error}");
    let results = plan
        .to_create
        .iter()
        .map(|grant| GrantResult {
            grant: grant.clone(),
            outcome: GrantOutcome::Failed {
                reason: reason.clone(),
            },
        })
        .collect();

    ReconcileReport {
        plane,
        plan,
        results,
        listing_error: Some(error.to_string()),
    }
}

async fn create_grant(
    store: &dyn AssignmentStore,
    plane: AssignmentPlane,
    account: &AccountRef,
    grant: &DesiredGrant,
) -> GrantOutcome {
    let assignment_id = AssignmentId::generate();
    let input = CreateAssignmentInput {
        scope: grant.scope.clone(),
        assignment_id: assignment_id.clone(),
        principal_id: grant.principal_id.clone(),
        role_definition_id: grant.role_definition_id.clone(),
    };

    match store.create_assignment(account, input).await {
        Ok(_) => {
            info!(
                plane = %plane,
                assignment_id = %assignment_id,
                grant = %grant,
                "role assignment created"
            );
            GrantOutcome::Created { assignment_id }
        }
        Err(error) if is_already_exists(&error) => {
            info!(plane = %plane, grant = %grant, "role assignment already exists");
            GrantOutcome::AlreadyExists
        }
        Err(error) => {
            warn!(
                plane = %plane,
                grant = %grant,
                error = %error,
                "failed to create role assignment"
            );
            GrantOutcome::Failed {
                reason: error.to_string(),
            }
        }
    }
}
