use std::fmt::{Display, Formatter};

use grantctl_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Display name and contact used when no directory object matched.
pub const PRINCIPAL_NOT_FOUND: &str = "Not Found";

/// Opaque identifier of a directory principal.
///
/// Principal ids are always supplied by configuration or observed on existing
/// assignments; they are never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(NonEmptyString);

impl PrincipalId {
    /// Creates a validated principal identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value.into().trim())?))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PrincipalId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Kind of directory object a principal resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Human user account.
    User,
    /// Application or managed identity.
    ServicePrincipal,
    /// Security or Microsoft 365 group.
    Group,
    /// No directory object matched the id.
    Unknown,
    /// The directory could not be queried.
    Error,
}

impl PrincipalKind {
    /// Returns the human-readable label for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::ServicePrincipal => "Service Principal",
            Self::Group => "Group",
            Self::Unknown => "Unknown",
            Self::Error => "Error",
        }
    }

    /// Directory kinds in the order they are looked up.
    #[must_use]
    pub fn lookup_order() -> &'static [Self] {
        const ORDER: &[PrincipalKind] = &[
            PrincipalKind::User,
            PrincipalKind::ServicePrincipal,
            PrincipalKind::Group,
        ];

        ORDER
    }
}

impl Display for PrincipalKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Resolved identity details for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalInfo {
    /// Display name from the directory, or a degradation marker.
    pub display_name: String,
    /// Mail address, user principal name or application id.
    pub contact: String,
    /// Resolved directory kind.
    pub kind: PrincipalKind,
}

impl PrincipalInfo {
    /// Creates a resolved principal from directory fields.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        contact: impl Into<String>,
        kind: PrincipalKind,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            contact: contact.into(),
            kind,
        }
    }

    /// Principal that no directory lookup matched.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(
            PRINCIPAL_NOT_FOUND,
            PRINCIPAL_NOT_FOUND,
            PrincipalKind::Unknown,
        )
    }

    /// Principal whose lookup failed as a whole.
    #[must_use]
    pub fn lookup_failed(reason: &str) -> Self {
        Self::new(format!("Error: {reason}"), "Error", PrincipalKind::Error)
    }

    /// Returns whether the principal resolved to a directory object.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self.kind, PrincipalKind::Unknown | PrincipalKind::Error)
    }
}
