//! grantctl command-line runtime.

#![forbid(unsafe_code)]

mod cli_config;
mod render;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use grantctl_application::{
    AccountRef, AssignmentReconciler, AssignmentReportService, AssignmentStore, AssignmentStores,
    IdentityResolver, RbacSetupPlan,
};
use grantctl_core::{AppError, AppResult};
use grantctl_domain::RoleCatalog;
use grantctl_infrastructure::{
    ArmAuthorizationRoleAssignmentStore, ArmClient, ArmSqlRoleAssignmentStore,
    GraphIdentityProvider, InMemoryAssignmentStore,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli_config::CliConfig;
use crate::render::{render_role_report, render_setup_report};

/// Reports and reconciles role assignments for one database account.
#[derive(Parser, Debug)]
#[command(name = "grantctl", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Supported subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// List data-plane role assignments grouped by role and scope.
    ListRoles {
        /// Print the grouped report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Grant PRINCIPAL_ID account reader and data contributor access.
    SetupRbac {
        /// Reconcile against the current listings without creating anything.
        #[arg(long)]
        dry_run: bool,
        /// Print the setup report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CliConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    info!(
        account = %config.account_name,
        resource_group = %config.resource_group,
        endpoint = config.cosmos_endpoint.as_ref().map(|url| url.as_str()).unwrap_or("<unset>"),
        "grantctl started"
    );

    match cli.command {
        Command::ListRoles { json } => list_roles(&config, http_client, json).await,
        Command::SetupRbac { dry_run, json } => {
            setup_rbac(&config, http_client, dry_run, json).await
        }
    }
}

async fn list_roles(config: &CliConfig, http_client: reqwest::Client, json: bool) -> AppResult<()> {
    let arm_client = ArmClient::new(
        http_client.clone(),
        config.arm_base_url.as_str(),
        config.arm_access_token.as_str(),
    );
    let store = ArmSqlRoleAssignmentStore::new(arm_client, config.subscription_id.as_str());
    let provider = GraphIdentityProvider::new(
        http_client,
        config.graph_base_url.as_str(),
        config.graph_access_token()?,
    );
    let resolver = IdentityResolver::new(Arc::new(provider))
        .with_max_concurrency(config.resolve_concurrency);
    let service = AssignmentReportService::new(RoleCatalog::builtin(), config.scope_names()?);

    let groups = service
        .report_from_store(&store, &config.account_ref(), &resolver)
        .await?;
    info!(
        groups = groups.len(),
        principals = resolver.cached_len().await,
        "role assignment report built"
    );

    if json {
        println!("{}", to_json(&groups)?);
    } else {
        let rendered =
            render_role_report(config.account_name.as_str(), chrono::Utc::now(), &groups)
                .map_err(render_error)?;
        print!("{rendered}");
    }

    Ok(())
}

async fn setup_rbac(
    config: &CliConfig,
    http_client: reqwest::Client,
    dry_run: bool,
    json: bool,
) -> AppResult<()> {
    let principal_id = config.principal_id()?;
    let paths = config.scope_paths()?;
    let account = config.account_ref();

    let arm_client = ArmClient::new(
        http_client,
        config.arm_base_url.as_str(),
        config.arm_access_token.as_str(),
    );
    let live_management: Arc<dyn AssignmentStore> = Arc::new(
        ArmAuthorizationRoleAssignmentStore::new(arm_client.clone(), config.subscription_id.as_str()),
    );
    let live_data_plane: Arc<dyn AssignmentStore> = Arc::new(ArmSqlRoleAssignmentStore::new(
        arm_client,
        config.subscription_id.as_str(),
    ));

    let stores = if dry_run {
        AssignmentStores {
            management: dry_run_store(live_management, &account).await?,
            data_plane: dry_run_store(live_data_plane, &account).await?,
        }
    } else {
        AssignmentStores {
            management: live_management,
            data_plane: live_data_plane,
        }
    };

    let plan = RbacSetupPlan::for_principal(&principal_id, &paths);
    let report = AssignmentReconciler::new(stores)
        .apply_setup_plan(&account, &plan)
        .await?;

    if json {
        println!("{}", to_json(&report)?);
    } else {
        let rendered = render_setup_report(
            &principal_id,
            &paths,
            &RoleCatalog::builtin(),
            &report,
            dry_run,
            chrono::Utc::now(),
        )
        .map_err(render_error)?;
        print!("{rendered}");
    }

    let failed = report.management.failures().len() + report.data_plane.failures().len();
    if report.has_failures() {
        warn!(principal_id = %principal_id, failed, "rbac setup finished with failures");
        return Err(AppError::Internal(format!(
            "{failed} role assignment(s) could not be created"
        )));
    }

    info!(principal_id = %principal_id, dry_run, "rbac setup complete");
    Ok(())
}

async fn dry_run_store(
    live: Arc<dyn AssignmentStore>,
    account: &AccountRef,
) -> AppResult<Arc<dyn AssignmentStore>> {
    match live.list_assignments(account).await {
        Ok(observed) => Ok(Arc::new(InMemoryAssignmentStore::with_assignments(observed))),
        Err(error @ AppError::Unavailable(_)) => Err(error),
        // A failed listing stops the reconciler before any create reaches the live store.
        Err(_) => Ok(live),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to serialize output: {error}")))
}

fn render_error(error: std::fmt::Error) -> AppError {
    AppError::Internal(format!("failed to render output: {error}"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
