use grantctl_core::{AppError, AppResult};
use grantctl_domain::{AssignmentId, PrincipalId, RoleAssignment, RoleDefinitionId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Default management API endpoint.
pub const DEFAULT_ARM_BASE_URL: &str = "https://management.azure.com";

/// Thin authenticated client for the resource management REST API.
#[derive(Clone)]
pub struct ArmClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

/// One page of a list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArmPage<T> {
    #[serde(default = "Vec::new")]
    pub(crate) value: Vec<T>,
    pub(crate) next_link: Option<String>,
}

/// Role assignment resource as returned by both assignment APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ArmRoleAssignment {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) properties: ArmRoleAssignmentProperties,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArmRoleAssignmentProperties {
    #[serde(default)]
    pub(crate) role_definition_id: String,
    #[serde(default)]
    pub(crate) principal_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) scope: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ArmRoleAssignmentBody {
    pub(crate) properties: ArmRoleAssignmentProperties,
}

impl ArmRoleAssignment {
    /// Converts a wire resource, skipping entries without a principal.
    pub(crate) fn into_role_assignment(self) -> Option<RoleAssignment> {
        let principal_id = match PrincipalId::new(self.properties.principal_id) {
            Ok(principal_id) => principal_id,
            Err(_) => {
                warn!(
                    assignment_id = %self.name,
                    "skipping role assignment without principal id"
                );
                return None;
            }
        };

        Some(RoleAssignment {
            assignment_id: AssignmentId::new(self.name),
            principal_id,
            role_definition_id: RoleDefinitionId::new(self.properties.role_definition_id),
            scope: self.properties.scope,
        })
    }
}

impl ArmClient {
    /// Creates a client for a management endpoint and bearer token.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
        }
    }

    /// Builds a request URL from a resource path and query pairs.
    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = Url::parse(format!("{}{path}", self.base_url).as_str()).map_err(|error| {
            AppError::Validation(format!("invalid management URL for '{path}': {error}"))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Fetches every page of a list endpoint.
    pub(crate) async fn list_all<T: DeserializeOwned>(&self, url: Url) -> AppResult<Vec<T>> {
        let mut values = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next {
            debug!(url = %page_url, "fetching management list page");
            let response = self
                .http_client
                .get(page_url.as_str())
                .bearer_auth(self.access_token.as_str())
                .send()
                .await
                .map_err(|error| transport_error("management list", &error))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<body unavailable>".to_owned());
                return Err(status_error(status.as_u16(), body.as_str(), "management list"));
            }

            let page = response.json::<ArmPage<T>>().await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse management list response body: {error}"
                ))
            })?;
            values.extend(page.value);
            next = page.next_link.filter(|link| !link.trim().is_empty());
        }

        Ok(values)
    }

    /// Sends a PUT with a JSON body; any 2xx status is success.
    pub(crate) async fn put_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> AppResult<()> {
        let response = self
            .http_client
            .put(url)
            .bearer_auth(self.access_token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|error| transport_error("management create", &error))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(status_error(status.as_u16(), body.as_str(), "management create"))
    }
}

/// Maps a non-success HTTP status to an application error.
pub(crate) fn status_error(status: u16, body: &str, context: &str) -> AppError {
    let message = format!("{context} returned status {status}: {body}");
    match status {
        401 => AppError::Unauthorized(message),
        403 => AppError::Forbidden(message),
        404 => AppError::NotFound(message),
        409 => AppError::Conflict(message),
        429 | 500..=599 => AppError::Unavailable(message),
        400..=499 => AppError::Validation(message),
        _ => AppError::Internal(message),
    }
}

pub(crate) fn transport_error(context: &str, error: &reqwest::Error) -> AppError {
    AppError::Unavailable(format!("{context} transport error: {error}"))
}
