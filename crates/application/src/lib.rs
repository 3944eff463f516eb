//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_ports;
mod assignment_report_service;
mod identity_ports;
mod identity_resolver;
mod reconcile_service;
mod setup_plan;

pub use assignment_ports::{AccountRef, AssignmentStore, CreateAssignmentInput};
pub use assignment_report_service::{AssignmentReportService, GroupedRole, RoleMember};
pub use identity_ports::{
    DirectoryGroup, DirectoryServicePrincipal, DirectoryUser, IdentityProvider,
};
pub use identity_resolver::{DEFAULT_RESOLVE_CONCURRENCY, IdentityResolver};
pub use reconcile_service::{
    AssignmentReconciler, AssignmentStores, GrantOutcome, GrantPlan, GrantResult,
    ReconcileReport, is_already_exists, plan_grants,
};
pub use setup_plan::{RbacSetupPlan, SetupReport};
