use std::env;

use grantctl_application::{AccountRef, DEFAULT_RESOLVE_CONCURRENCY};
use grantctl_core::{AppError, AppResult};
use grantctl_domain::{PrincipalId, ScopeNames, ScopePaths};
use grantctl_infrastructure::{DEFAULT_ARM_BASE_URL, DEFAULT_GRAPH_BASE_URL};
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub account_name: String,
    pub database_name: String,
    pub container_name: String,
    pub cosmos_endpoint: Option<Url>,
    pub arm_access_token: String,
    pub graph_access_token: Option<String>,
    pub arm_base_url: String,
    pub graph_base_url: String,
    pub principal_id: Option<String>,
    pub resolve_concurrency: usize,
    pub http_timeout_seconds: u64,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let subscription_id = required_env(&lookup, "SUBSCRIPTION_ID")?;
        let resource_group = required_env(&lookup, "RESOURCE_GROUP")?;
        let account_name = required_env(&lookup, "ACCOUNT_NAME")?;
        let database_name = required_env(&lookup, "DATABASE_NAME")?;
        let container_name = required_env(&lookup, "CONTAINER_NAME")?;
        let arm_access_token = required_env(&lookup, "ARM_ACCESS_TOKEN")?;

        let cosmos_endpoint = optional_env(&lookup, "COSMOS_ENDPOINT")
            .map(|value| {
                Url::parse(value.as_str()).map_err(|error| {
                    AppError::Validation(format!("invalid COSMOS_ENDPOINT '{value}': {error}"))
                })
            })
            .transpose()?;

        let arm_base_url = base_url_env(&lookup, "ARM_BASE_URL", DEFAULT_ARM_BASE_URL)?;
        let graph_base_url = base_url_env(&lookup, "GRAPH_BASE_URL", DEFAULT_GRAPH_BASE_URL)?;
        let resolve_concurrency =
            parse_env_usize(&lookup, "RESOLVE_CONCURRENCY", DEFAULT_RESOLVE_CONCURRENCY)?;
        let http_timeout_seconds =
            parse_env_u64(&lookup, "HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECONDS)?;

        if resolve_concurrency == 0 {
            return Err(AppError::Validation(
                "RESOLVE_CONCURRENCY must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            subscription_id,
            resource_group,
            account_name,
            database_name,
            container_name,
            cosmos_endpoint,
            arm_access_token,
            graph_access_token: optional_env(&lookup, "GRAPH_ACCESS_TOKEN"),
            arm_base_url,
            graph_base_url,
            principal_id: optional_env(&lookup, "PRINCIPAL_ID"),
            resolve_concurrency,
            http_timeout_seconds,
        })
    }

    pub fn scope_names(&self) -> AppResult<ScopeNames> {
        ScopeNames::new(
            self.account_name.as_str(),
            self.database_name.as_str(),
            self.container_name.as_str(),
        )
    }

    pub fn scope_paths(&self) -> AppResult<ScopePaths> {
        ScopePaths::new(
            self.subscription_id.as_str(),
            self.resource_group.as_str(),
            &self.scope_names()?,
        )
    }

    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(self.resource_group.as_str(), self.account_name.as_str())
    }

    pub fn graph_access_token(&self) -> AppResult<&str> {
        self.graph_access_token
            .as_deref()
            .ok_or_else(|| AppError::Validation("GRAPH_ACCESS_TOKEN is required".to_owned()))
    }

    pub fn principal_id(&self) -> AppResult<PrincipalId> {
        let value = self.principal_id.as_deref().ok_or_else(|| {
            AppError::Validation(
                "PRINCIPAL_ID is required; get it with: az ad signed-in-user show --query id -o tsv"
                    .to_owned(),
            )
        })?;

        PrincipalId::new(value)
    }
}

fn required_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    optional_env(lookup, name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn base_url_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> AppResult<String> {
    let value = optional_env(lookup, name).unwrap_or_else(|| default.to_owned());
    Url::parse(value.as_str())
        .map_err(|error| AppError::Validation(format!("invalid {name} value '{value}': {error}")))?;

    Ok(value.trim_end_matches('/').to_owned())
}

fn parse_env_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> AppResult<usize> {
    match optional_env(lookup, name) {
        Some(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> AppResult<u64> {
    match optional_env(lookup, name) {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
