//! Scope hierarchy for database account role assignments.
//!
//! Scopes are resource paths. A container scope extends its database scope,
//! which extends the account scope:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.DocumentDB/databaseAccounts/{account}
//!     /dbs/{database}
//!         /colls/{container}
//! ```

use std::fmt::{Display, Formatter};

use grantctl_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Level of the scope hierarchy an assignment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Whole database account.
    Account,
    /// One database inside the account.
    Database,
    /// One container inside a database.
    Container,
    /// Anything that does not match the configured names.
    Other,
}

impl ScopeLevel {
    /// Returns the human-readable label for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Database => "Database",
            Self::Container => "Container",
            Self::Other => "Other",
        }
    }

    /// Classifies a scope string against the configured resource names.
    ///
    /// Matching is by exact suffix and starts from the most specific level, since
    /// database and container scopes both carry the account path as a prefix.
    #[must_use]
    pub fn classify(scope: &str, account: &str, database: &str, container: &str) -> Self {
        if scope.ends_with(format!("/colls/{container}").as_str()) {
            Self::Container
        } else if scope.ends_with(format!("/dbs/{database}").as_str()) {
            Self::Database
        } else if scope.ends_with(account) {
            Self::Account
        } else {
            Self::Other
        }
    }
}

impl Display for ScopeLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Names of the account, database and container a run is configured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeNames {
    account: NonEmptyString,
    database: NonEmptyString,
    container: NonEmptyString,
}

impl ScopeNames {
    /// Creates validated scope names.
    pub fn new(
        account: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            account: NonEmptyString::new(account)?,
            database: NonEmptyString::new(database)?,
            container: NonEmptyString::new(container)?,
        })
    }

    /// Returns the database account name.
    #[must_use]
    pub fn account(&self) -> &str {
        self.account.as_str()
    }

    /// Returns the database name.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    /// Returns the container name.
    #[must_use]
    pub fn container(&self) -> &str {
        self.container.as_str()
    }

    /// Classifies a scope string against these names.
    #[must_use]
    pub fn classify(&self, scope: &str) -> ScopeLevel {
        ScopeLevel::classify(scope, self.account(), self.database(), self.container())
    }
}

/// Canonical scope paths for one configured account, database and container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePaths {
    subscription_id: String,
    account: String,
    database: String,
    container: String,
}

impl ScopePaths {
    /// Builds scope paths from the subscription, resource group and names.
    pub fn new(subscription_id: &str, resource_group: &str, names: &ScopeNames) -> AppResult<Self> {
        let subscription_id = NonEmptyString::new(subscription_id)?;
        let resource_group = NonEmptyString::new(resource_group)?;

        let account = format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.DocumentDB/databaseAccounts/{}",
            names.account()
        );
        let database = format!("{account}/dbs/{}", names.database());
        let container = format!("{database}/colls/{}", names.container());

        Ok(Self {
            subscription_id: subscription_id.into(),
            account,
            database,
            container,
        })
    }

    /// Returns the subscription the scopes live in.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        self.subscription_id.as_str()
    }

    /// Returns the account scope.
    #[must_use]
    pub fn account(&self) -> &str {
        self.account.as_str()
    }

    /// Returns the database scope.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    /// Returns the container scope.
    #[must_use]
    pub fn container(&self) -> &str {
        self.container.as_str()
    }

    /// Returns the scope path for a level, if the level has one.
    #[must_use]
    pub fn for_level(&self, level: ScopeLevel) -> Option<&str> {
        match level {
            ScopeLevel::Account => Some(self.account()),
            ScopeLevel::Database => Some(self.database()),
            ScopeLevel::Container => Some(self.container()),
            ScopeLevel::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ScopeLevel, ScopeNames, ScopePaths};

    fn names() -> ScopeNames {
        ScopeNames::new("hotels-account", "hotels", "rooms").unwrap_or_else(|_| unreachable!())
    }

    fn paths() -> ScopePaths {
        ScopePaths::new("sub-1", "rg-data", &names()).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn scope_paths_nest_container_under_database_under_account() {
        let paths = paths();

        assert_eq!(
            paths.account(),
            "/subscriptions/sub-1/resourceGroups/rg-data/providers/Microsoft.DocumentDB/databaseAccounts/hotels-account"
        );
        assert_eq!(paths.database(), format!("{}/dbs/hotels", paths.account()));
        assert_eq!(
            paths.container(),
            format!("{}/colls/rooms", paths.database())
        );
    }

    #[test]
    fn canonical_paths_classify_to_their_own_level() {
        let names = names();
        let paths = paths();

        for level in [ScopeLevel::Account, ScopeLevel::Database, ScopeLevel::Container] {
            let scope = paths.for_level(level).unwrap_or_default();
            assert_eq!(names.classify(scope), level);
        }
        assert_eq!(paths.for_level(ScopeLevel::Other), None);
    }

    #[test]
    fn unrelated_scope_is_other() {
        let names = names();

        assert_eq!(names.classify("/subscriptions/sub-1"), ScopeLevel::Other);
        assert_eq!(names.classify(""), ScopeLevel::Other);
        assert_eq!(
            names.classify("/dbs/hotels/colls/suites"),
            ScopeLevel::Other
        );
    }

    #[test]
    fn scope_names_reject_blank_values() {
        assert!(ScopeNames::new("account", " ", "container").is_err());
    }

    proptest! {
        #[test]
        fn container_suffix_always_wins(
            prefix in ".*",
            account in "[a-z][a-z0-9-]{0,12}",
            database in "[a-z][a-z0-9-]{0,12}",
            container in "[a-z][a-z0-9-]{0,12}",
        ) {
            let scope = format!("{prefix}{account}/dbs/{database}/colls/{container}");
            prop_assert_eq!(
                ScopeLevel::classify(&scope, &account, &database, &container),
                ScopeLevel::Container
            );
        }

        #[test]
        fn database_suffix_without_container_is_database(
            prefix in "[a-zA-Z0-9/]*",
            account in "[a-z][a-z0-9-]{0,12}",
            database in "[a-z][a-z0-9-]{0,12}",
            container in "[A-Z]{1,8}",
        ) {
            let scope = format!("{prefix}{account}/dbs/{database}");
            prop_assert_eq!(
                ScopeLevel::classify(&scope, &account, &database, &container),
                ScopeLevel::Database
            );
        }

        #[test]
        fn classification_is_total(
            scope in ".*",
            account in ".*",
            database in ".*",
            container in ".*",
        ) {
            let level = ScopeLevel::classify(&scope, &account, &database, &container);
            prop_assert!(matches!(
                level,
                ScopeLevel::Account | ScopeLevel::Database | ScopeLevel::Container | ScopeLevel::Other
            ));
        }
    }
}
