use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Built-in data-plane role granting read access to documents.
pub const DATA_READER_ROLE_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Built-in data-plane role granting read and write access to documents.
pub const DATA_CONTRIBUTOR_ROLE_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Built-in management-plane role granting read access to account metadata.
pub const ACCOUNT_READER_ROLE_ID: &str = "fbdf93bf-df7d-467e-a4d2-9458aa1360c8";

/// Display name of [`DATA_READER_ROLE_ID`].
pub const DATA_READER_ROLE_NAME: &str = "Cosmos DB Built-in Data Reader";

/// Display name of [`DATA_CONTRIBUTOR_ROLE_ID`].
pub const DATA_CONTRIBUTOR_ROLE_NAME: &str = "Cosmos DB Built-in Data Contributor";

/// Display name of [`ACCOUNT_READER_ROLE_ID`].
pub const ACCOUNT_READER_ROLE_NAME: &str = "Cosmos DB Account Reader Role";

/// Name reported for role definitions missing from the catalog.
pub const CUSTOM_ROLE_NAME: &str = "Custom/Other Role";

/// Opaque role definition identifier as stored on an assignment.
///
/// The value is usually a full resource path ending in the role GUID, but
/// bare GUIDs and malformed values are accepted as observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleDefinitionId(String);

impl RoleDefinitionId {
    /// Wraps an observed role definition identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the data-plane role definition path under an account scope.
    #[must_use]
    pub fn data_plane(account_scope: &str, role_guid: &str) -> Self {
        Self(format!("{account_scope}/sqlRoleDefinitions/{role_guid}"))
    }

    /// Builds the management-plane role definition path in a subscription.
    #[must_use]
    pub fn management_plane(subscription_id: &str, role_guid: &str) -> Self {
        Self(format!(
            "/subscriptions/{subscription_id}/providers/Microsoft.Authorization/roleDefinitions/{role_guid}"
        ))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the last path segment, which carries the role GUID.
    #[must_use]
    pub fn terminal_segment(&self) -> &str {
        let trimmed = self.0.trim().trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

impl Display for RoleDefinitionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Static mapping from role definition GUIDs to display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    names: HashMap<String, String>,
}

impl RoleCatalog {
    /// Creates a catalog with no entries; every lookup falls back to
    /// [`CUSTOM_ROLE_NAME`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Creates the catalog of well-known built-in roles.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_role(DATA_READER_ROLE_ID, DATA_READER_ROLE_NAME)
            .with_role(DATA_CONTRIBUTOR_ROLE_ID, DATA_CONTRIBUTOR_ROLE_NAME)
            .with_role(ACCOUNT_READER_ROLE_ID, ACCOUNT_READER_ROLE_NAME)
    }

    /// Adds or replaces one catalog entry.
    #[must_use]
    pub fn with_role(mut self, role_guid: &str, role_name: impl Into<String>) -> Self {
        self.names
            .insert(role_guid.trim().to_ascii_lowercase(), role_name.into());
        self
    }

    /// Resolves a role definition to its display name. Never fails.
    #[must_use]
    pub fn role_name(&self, role_definition_id: &RoleDefinitionId) -> &str {
        let key = role_definition_id.terminal_segment().to_ascii_lowercase();
        self.names
            .get(key.as_str())
            .map(String::as_str)
            .unwrap_or(CUSTOM_ROLE_NAME)
    }

    /// Returns whether the catalog knows the role definition.
    #[must_use]
    pub fn contains(&self, role_definition_id: &RoleDefinitionId) -> bool {
        self.role_name(role_definition_id) != CUSTOM_ROLE_NAME
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
