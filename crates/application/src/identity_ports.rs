use async_trait::async_trait;

use grantctl_core::AppResult;
use grantctl_domain::{PrincipalId, PrincipalInfo, PrincipalKind};

const UNKNOWN_DISPLAY_NAME: &str = "Unknown";
const NO_CONTACT: &str = "No email";

/// User record returned by a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Display name, when set.
    pub display_name: Option<String>,
    /// Primary mail address, when set.
    pub mail: Option<String>,
    /// Sign-in name, used when no mail address is set.
    pub user_principal_name: Option<String>,
}

/// Service principal record returned by a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryServicePrincipal {
    /// Display name, when set.
    pub display_name: Option<String>,
    /// Application (client) id.
    pub app_id: Option<String>,
}

/// Group record returned by a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Display name, when set.
    pub display_name: Option<String>,
    /// Group mail address, when mail-enabled.
    pub mail: Option<String>,
}

impl From<DirectoryUser> for PrincipalInfo {
    fn from(value: DirectoryUser) -> Self {
        PrincipalInfo::new(
            non_blank(value.display_name).unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_owned()),
            non_blank(value.mail)
                .or_else(|| non_blank(value.user_principal_name))
                .unwrap_or_else(|| NO_CONTACT.to_owned()),
            PrincipalKind::User,
        )
    }
}

impl From<DirectoryServicePrincipal> for PrincipalInfo {
    fn from(value: DirectoryServicePrincipal) -> Self {
        PrincipalInfo::new(
            non_blank(value.display_name).unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_owned()),
            non_blank(value.app_id).unwrap_or_else(|| NO_CONTACT.to_owned()),
            PrincipalKind::ServicePrincipal,
        )
    }
}

impl From<DirectoryGroup> for PrincipalInfo {
    fn from(value: DirectoryGroup) -> Self {
        PrincipalInfo::new(
            non_blank(value.display_name).unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_owned()),
            non_blank(value.mail).unwrap_or_else(|| NO_CONTACT.to_owned()),
            PrincipalKind::Group,
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Directory port used to resolve principal ids.
///
/// Each lookup returns `Ok(None)` (or `AppError::NotFound`) when the id is not
/// an object of that kind, and another error when the directory call failed.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up a user by object id.
    async fn get_user(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryUser>>;

    /// Looks up a service principal by object id.
    async fn get_service_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> AppResult<Option<DirectoryServicePrincipal>>;

    /// Looks up a group by object id.
    async fn get_group(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryGroup>>;
}
