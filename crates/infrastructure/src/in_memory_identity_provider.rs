use std::collections::HashMap;

use async_trait::async_trait;
use grantctl_application::{
    DirectoryGroup, DirectoryServicePrincipal, DirectoryUser, IdentityProvider,
};
use grantctl_core::AppResult;
use grantctl_domain::PrincipalId;

/// Static directory keyed by principal id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    users: HashMap<String, DirectoryUser>,
    service_principals: HashMap<String, DirectoryServicePrincipal>,
    groups: HashMap<String, DirectoryGroup>,
}

impl InMemoryIdentityProvider {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user record.
    #[must_use]
    pub fn with_user(mut self, principal_id: impl Into<String>, user: DirectoryUser) -> Self {
        self.users.insert(principal_id.into(), user);
        self
    }

    /// Adds a service principal record.
    #[must_use]
    pub fn with_service_principal(
        mut self,
        principal_id: impl Into<String>,
        service_principal: DirectoryServicePrincipal,
    ) -> Self {
        self.service_principals
            .insert(principal_id.into(), service_principal);
        self
    }

    /// Adds a group record.
    #[must_use]
    pub fn with_group(mut self, principal_id: impl Into<String>, group: DirectoryGroup) -> Self {
        self.groups.insert(principal_id.into(), group);
        self
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryUser>> {
        Ok(self.users.get(principal_id.as_str()).cloned())
    }

    async fn get_service_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> AppResult<Option<DirectoryServicePrincipal>> {
        Ok(self.service_principals.get(principal_id.as_str()).cloned())
    }

    async fn get_group(&self, principal_id: &PrincipalId) -> AppResult<Option<DirectoryGroup>> {
        Ok(self.groups.get(principal_id.as_str()).cloned())
    }
}
