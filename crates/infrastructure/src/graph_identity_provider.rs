use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use grantctl_application::{
    DirectoryGroup, DirectoryServicePrincipal, DirectoryUser, IdentityProvider,
};
use grantctl_core::{AppError, AppResult};
use grantctl_domain::PrincipalId;

use crate::arm_client::{status_error, transport_error};

/// Default directory API endpoint.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com";

/// Identity provider backed by the directory REST API.
#[derive(Clone)]
pub struct GraphIdentityProvider {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    display_name: Option<String>,
    mail: Option<String>,
    user_principal_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphServicePrincipal {
    display_name: Option<String>,
    app_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphGroup {
    display_name: Option<String>,
    mail: Option<String>,
}

impl From<GraphUser> for DirectoryUser {
    fn from(value: GraphUser) -> Self {
        Self {
            display_name: value.display_name,
            mail: value.mail,
            user_principal_name: value.user_principal_name,
        }
    }
}

impl From<GraphServicePrincipal> for DirectoryServicePrincipal {
    fn from(value: GraphServicePrincipal) -> Self {
        Self {
            display_name: value.display_name,
            app_id: value.app_id,
        }
    }
}

impl From<GraphGroup> for DirectoryGroup {
    fn from(value: GraphGroup) -> Self {
        Self {
            display_name: value.display_name,
            mail: value.mail,
        }
    }
}

impl GraphIdentityProvider {
    /// Creates a provider for a directory endpoint and bearer token.
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

    fn object_url(&self, collection: &str, principal_id: &PrincipalId) -> AppResult<Url> {
        let mut url = Url::parse(self.base_url.as_str()).map_err(|error| {
            AppError::Validation(format!(
                "invalid directory base URL '{}': {error}",
                self.base_url
            ))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!(
                    "directory base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["v1.0", collection, principal_id.as_str()]);
        Ok(url)
    }

    /// Fetches one directory object; a missing object is `Ok(None)`.
    async fn get_object<T: DeserializeOwned>(
        &self,
        collection: &str,
        principal_id: &PrincipalId,
    ) -> AppResult<Option<T>> {
        let url = self.object_url(collection, principal_id)?;
        let context = format!("directory {collection} lookup");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.access_token.as_str())
            .send()
            .await
            .map_err(|error| transport_error(context.as_str(), &error))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(principal_id = %principal_id, collection, "directory object not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(status_error(status.as_u16(), body.as_str(), context.as_str()));
        }

        response.json::<T>().await.map(Some).map_err(|error| {
            AppError::Internal(format!("failed to parse {context} response body: {error}"))
        })
    }
}

#[async_trait]
impl IdentityProvider for GraphIdentityProvider {
    async fn get_user(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryUser>> {
        Ok(self
            .get_object::<GraphUser>("users", principal_id)
            .await?
            .map(DirectoryUser::from))
    }

    async fn get_service_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> AppResult<Option<DirectoryServicePrincipal>> {
        Ok(self
            .get_object::<GraphServicePrincipal>("servicePrincipals", principal_id)
            .await?
            .map(DirectoryServicePrincipal::from))
    }

    async fn get_group(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryGroup>> {
        Ok(self
            .get_object::<GraphGroup>("groups", principal_id)
            .await?
            .map(DirectoryGroup::from))
    }
}

#[cfg(test)]
mod tests {
    use grantctl_application::DirectoryUser;
    use grantctl_domain::PrincipalId;
    use serde_json::json;

    use super::{GraphIdentityProvider, GraphServicePrincipal, GraphUser};

    #[test]
    fn object_url_encodes_principal_segment() {
        let provider =
            GraphIdentityProvider::new(reqwest::Client::new(), "https://graph.test/", "token");
        let principal_id = PrincipalId::new("a b").unwrap_or_else(|_| unreachable!());

        let url = provider.object_url("users", &principal_id);

        assert_eq!(
            url.map(|url| url.to_string()).unwrap_or_default(),
            "https://graph.test/v1.0/users/a%20b"
        );
    }

    #[test]
    fn user_payload_maps_to_directory_user() {
        let user = serde_json::from_value::<GraphUser>(json!({
            "id": "p1",
            "displayName": "Alice",
            "mail": null,
            "userPrincipalName": "alice@contoso.test"
        }))
        .map(DirectoryUser::from)
        .unwrap_or_default();

        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        assert_eq!(user.mail, None);
        assert_eq!(user.user_principal_name.as_deref(), Some("alice@contoso.test"));
    }

    #[test]
    fn service_principal_payload_tolerates_missing_fields() {
        let parsed = serde_json::from_value::<GraphServicePrincipal>(json!({ "id": "p2" }));

        assert!(parsed.is_ok());
        let parsed = parsed.unwrap_or_else(|_| unreachable!());
        assert!(parsed.display_name.is_none());
        assert!(parsed.app_id.is_none());
    }
}
