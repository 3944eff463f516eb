use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use grantctl_core::AppResult;
use grantctl_domain::{PrincipalId, PrincipalInfo, PrincipalKind};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::IdentityProvider;

/// Default number of directory lookups run at once by [`IdentityResolver::resolve_all`].
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

/// Resolves principal ids to directory details, caching results for one run.
///
/// Resolution never fails: lookup failures degrade to [`PrincipalKind::Unknown`]
/// or [`PrincipalKind::Error`] entries.
#[derive(Clone)]
pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    cache: Arc<Mutex<HashMap<PrincipalId, PrincipalInfo>>>,
    max_concurrency: usize,
}

impl IdentityResolver {
    /// Creates a resolver with an empty cache.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(Mutex::new(HashMap::new())),
            max_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }

    /// Sets how many lookups [`Self::resolve_all`] runs in parallel.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Resolves one principal, consulting the run cache first.
    pub async fn resolve(&self, principal_id: &PrincipalId) -> PrincipalInfo {
        if let Some(cached) = self.cache.lock().await.get(principal_id) {
            return cached.clone();
        }

        let info = lookup_principal(self.provider.as_ref(), principal_id).await;
        self.cache
            .lock()
            .await
            .entry(principal_id.clone())
            .or_insert(info)
            .clone()
    }

    /// Resolves many principals on a bounded set of parallel lookups.
    ///
    /// Duplicate ids are looked up once. The returned map has an entry for every
    /// requested id.
    pub async fn resolve_all(
        &self,
        principal_ids: &[PrincipalId],
    ) -> HashMap<PrincipalId, PrincipalInfo> {
        let mut seen = HashSet::new();
        let unique_ids: Vec<PrincipalId> = principal_ids
            .iter()
            .filter(|principal_id| seen.insert((*principal_id).clone()))
            .cloned()
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        for principal_id in unique_ids.iter().cloned() {
            let resolver = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let info = resolver.resolve(&principal_id).await;
                (principal_id, info)
            });
        }

        let mut resolved = HashMap::with_capacity(unique_ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((principal_id, info)) => {
                    resolved.insert(principal_id, info);
                }
                Err(error) => {
                    warn!(error = %error, "principal lookup task did not complete");
                }
            }
        }

        for principal_id in unique_ids {
            resolved
                .entry(principal_id)
                .or_insert_with(|| PrincipalInfo::lookup_failed("lookup task did not complete"));
        }

        resolved
    }

    /// Returns how many principals are cached for this run.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

async fn lookup_principal(
    provider: &dyn IdentityProvider,
    principal_id: &PrincipalId,
) -> PrincipalInfo {
    let mut answered_not_found = false;
    let mut last_fault: Option<String> = None;

    for kind in PrincipalKind::lookup_order() {
        match lookup_kind(provider, *kind, principal_id).await {
            Ok(Some(info)) => return info,
            Ok(None) => answered_not_found = true,
            Err(error) if error.is_not_found() => answered_not_found = true,
            Err(error) => {
                debug!(
                    principal_id = %principal_id,
                    kind = %kind,
                    error = %error,
                    "principal lookup failed, trying next kind"
                );
                last_fault = Some(error.to_string());
            }
        }
    }

    match last_fault {
        Some(reason) if !answered_not_found => PrincipalInfo::lookup_failed(reason.as_str()),
        _ => PrincipalInfo::not_found(),
    }
}

async fn lookup_kind(
    provider: &dyn IdentityProvider,
    kind: PrincipalKind,
    principal_id: &PrincipalId,
) -> AppResult<Option<PrincipalInfo>> {
    Ok(match kind {
        PrincipalKind::User => provider.get_user(principal_id).await?.map(Into::into),
        PrincipalKind::ServicePrincipal => provider
            .get_service_principal(principal_id)
            .await?
            .map(Into::into),
        PrincipalKind::Group => provider.get_group(principal_id).await?.map(Into::into),
        PrincipalKind::Unknown | PrincipalKind::Error => None,
    })
}
