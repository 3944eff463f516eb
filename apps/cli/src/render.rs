use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use grantctl_application::{GrantOutcome, GroupedRole, ReconcileReport, SetupReport};
use grantctl_domain::{PrincipalId, RoleCatalog, ScopePaths};

const SEPARATOR_WIDTH: usize = 60;

pub fn render_role_report(
    account_name: &str,
    generated_at: DateTime<Utc>,
    groups: &[GroupedRole],
) -> Result<String, fmt::Error> {
    let mut output = String::new();
    writeln!(output, "=== Role assignments for {account_name} ===")?;
    writeln!(output, "Generated at: {}", generated_at.to_rfc3339())?;

    if groups.is_empty() {
        writeln!(output, "No role assignments found.")?;
        return Ok(output);
    }

    for group in groups {
        writeln!(output, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        writeln!(output, "Role: {}", group.role_name)?;
        writeln!(output, "Scope level: {}", group.scope_level)?;
        writeln!(output, "Scope: {}", group.scope)?;
        writeln!(output, "Role definition: {}", group.role_definition_id)?;
        writeln!(output, "Members ({}):", group.members.len())?;
        for member in &group.members {
            writeln!(
                output,
                "  - {} <{}> [{}] principal {} (assignment {})",
                member.principal.display_name,
                member.principal.contact,
                member.principal.kind,
                member.principal_id,
                member.assignment_id
            )?;
        }
    }
    writeln!(output, "{}", "-".repeat(SEPARATOR_WIDTH))?;

    Ok(output)
}

pub fn render_setup_report(
    principal_id: &PrincipalId,
    paths: &ScopePaths,
    catalog: &RoleCatalog,
    report: &SetupReport,
    dry_run: bool,
    generated_at: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut output = String::new();
    let title = if dry_run {
        "RBAC setup plan (dry run)"
    } else {
        "RBAC setup"
    };
    writeln!(output, "=== {title} ===")?;
    writeln!(output, "Generated at: {}", generated_at.to_rfc3339())?;
    writeln!(output, "Principal ID: {principal_id}")?;
    writeln!(output, "Account scope: {}", paths.account())?;

    for plane_report in [&report.management, &report.data_plane] {
        render_plane(&mut output, catalog, plane_report)?;
    }

    let reports = [&report.management, &report.data_plane];
    let total = |predicate: fn(&GrantOutcome) -> bool| -> usize {
        reports.iter().map(|report| report.count(predicate)).sum()
    };
    writeln!(
        output,
        "Summary: created {}, already present {}, already exists {}, failed {}",
        total(|outcome| matches!(outcome, GrantOutcome::Created { .. })),
        total(|outcome| matches!(outcome, GrantOutcome::AlreadyPresent)),
        total(|outcome| matches!(outcome, GrantOutcome::AlreadyExists)),
        total(|outcome| matches!(outcome, GrantOutcome::Failed { .. })),
    )?;

    Ok(output)
}

fn render_plane(
    output: &mut String,
    catalog: &RoleCatalog,
    report: &ReconcileReport,
) -> fmt::Result {
    writeln!(output, "[{}]", report.plane)?;
    if let Some(error) = &report.listing_error {
        writeln!(output, "  listing failed: {error}")?;
    }
    for result in &report.results {
        let role_name = catalog.role_name(&result.grant.role_definition_id);
        let scope = result.grant.scope.as_str();
        let line = match &result.outcome {
            GrantOutcome::Created { assignment_id } => {
                format!("created         {role_name} @ {scope} (assignment {assignment_id})")
            }
            GrantOutcome::AlreadyPresent => {
                format!("already present {role_name} @ {scope}")
            }
            GrantOutcome::AlreadyExists => {
                format!("already exists  {role_name} @ {scope}")
            }
            GrantOutcome::Failed { reason } => {
                format!("failed          {role_name} @ {scope}: {reason}")
            }
        };
        writeln!(output, "  {line}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use grantctl_application::{
        GrantOutcome, GrantPlan, GrantResult, GroupedRole, ReconcileReport, RoleMember,
        SetupReport,
    };
    use grantctl_domain::{
        ACCOUNT_READER_ROLE_ID, AssignmentId, AssignmentPlane, DATA_CONTRIBUTOR_ROLE_ID,
        DesiredGrant, PrincipalId, PrincipalInfo, PrincipalKind, RoleCatalog, RoleDefinitionId,
        ScopeLevel, ScopeNames, ScopePaths,
    };

    use super::{render_role_report, render_setup_report};

    fn paths() -> ScopePaths {
        let names =
            ScopeNames::new("hotels-account", "hotels", "rooms").unwrap_or_else(|_| unreachable!());
        ScopePaths::new("sub-1", "rg-data", &names).unwrap_or_else(|_| unreachable!())
    }

    fn principal(value: &str) -> PrincipalId {
        PrincipalId::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn role_report_lists_each_group_with_members() {
        let paths = paths();
        let groups = vec![GroupedRole {
            role_name: "Cosmos DB Built-in Data Contributor".to_owned(),
            scope_level: ScopeLevel::Container,
            scope: paths.container().to_owned(),
            role_definition_id: RoleDefinitionId::data_plane(
                paths.account(),
                DATA_CONTRIBUTOR_ROLE_ID,
            ),
            members: vec![RoleMember {
                principal_id: principal("p1"),
                principal: PrincipalInfo::new("Alice", "alice@contoso.test", PrincipalKind::User),
                assignment_id: AssignmentId::new("a1"),
            }],
        }];
        let generated_at = Utc.timestamp_opt(0, 0).single().unwrap_or_default();

        let output =
            render_role_report("hotels-account", generated_at, &groups).unwrap_or_default();

        assert!(output.contains("=== Role assignments for hotels-account ==="));
        assert!(output.contains("Generated at: 1970-01-01T00:00:00+00:00"));
        assert!(output.contains("Role: Cosmos DB Built-in Data Contributor"));
        assert!(output.contains("Scope level: Container"));
        assert!(output.contains("Members (1):"));
        assert!(output.contains("  - Alice <alice@contoso.test> [User] principal p1 (assignment a1)"));
    }

    #[test]
    fn empty_role_report_says_so() {
        let output = render_role_report("hotels-account", Utc::now(), &[]).unwrap_or_default();

        assert!(output.contains("No role assignments found."));
    }

    #[test]
    fn setup_report_summarises_outcomes_across_planes() {
        let paths = paths();
        let principal_id = principal("p1");
        let reader = DesiredGrant::new(
            principal_id.clone(),
            RoleDefinitionId::management_plane(paths.subscription_id(), ACCOUNT_READER_ROLE_ID),
            paths.account(),
        );
        let contributor = DesiredGrant::new(
            principal_id.clone(),
            RoleDefinitionId::data_plane(paths.account(), DATA_CONTRIBUTOR_ROLE_ID),
            paths.database(),
        );
        let report = SetupReport {
            management: ReconcileReport {
                plane: AssignmentPlane::Management,
                plan: GrantPlan {
                    to_create: Vec::new(),
                    already_present: vec![reader.clone()],
                },
                results: vec![GrantResult {
                    grant: reader,
                    outcome: GrantOutcome::AlreadyPresent,
                }],
                listing_error: None,
            },
            data_plane: ReconcileReport {
                plane: AssignmentPlane::DataPlane,
                plan: GrantPlan {
                    to_create: vec![contributor.clone()],
                    already_present: Vec::new(),
                },
                results: vec![GrantResult {
                    grant: contributor,
                    outcome: GrantOutcome::Failed {
                        reason: "forbidden: denied".to_owned(),
                    },
                }],
                listing_error: None,
            },
        };

        let output = render_setup_report(
            &principal_id,
            &paths,
            &RoleCatalog::builtin(),
            &report,
            false,
            Utc::now(),
        )
        .unwrap_or_default();

        assert!(output.contains("=== RBAC setup ==="));
        assert!(output.contains("[management]"));
        assert!(output.contains("already present Cosmos DB Account Reader Role @ "));
        assert!(output.contains("failed          Cosmos DB Built-in Data Contributor @ "));
        assert!(output.contains(": forbidden: denied"));
        assert!(output.contains(
            "Summary: created 0, already present 1, already exists 0, failed 1"
        ));
    }
}
