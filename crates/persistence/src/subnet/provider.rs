//! Cache-first subnet provider
//!
//! Read path: per-address verdict cache, then local containment against the
//! cached snapshots, then the authoritative repository. Cache failures only
//! ever cost the shortcut — the repository remains the single source of
//! truth. Write path: repository first, then wholesale cache invalidation
//! and a best-effort snapshot re-warm.

use std::net::IpAddr;

use async_trait::async_trait;
use bruteguard_core::{ListKind, ListMembership, StorageError, SubnetEditor, SubnetLookup};
use tracing::warn;

use super::{SubnetCache, SubnetRepository};

/// Composes the repository and the cache behind the core lookup and editor
/// capabilities.
pub struct SubnetProvider {
    repo: SubnetRepository,
    cache: SubnetCache,
}

impl SubnetProvider {
    pub fn new(repo: SubnetRepository, cache: SubnetCache) -> Self {
        Self { repo, cache }
    }

    /// Rebuild the snapshot keys from the repository.
    ///
    /// Called once at startup and after every list edit so the local
    /// containment path stays warm; failures are the caller's to log.
    pub async fn refresh_lists(&self) -> Result<(), StorageError> {
        let (allow, deny) = self.repo.get_both_lists().await?;
        self.cache.set_both_lists(&allow, &deny).await
    }

    async fn lookup(&self, ip: IpAddr) -> Result<ListMembership, StorageError> {
        match self.cache.ip_verdict(ip).await {
            Ok(membership) => return Ok(membership),
            Err(err) if err.is_cache_miss() => {}
            Err(err) => {
                warn!(%ip, error = %err, "subnet verdict cache failed, falling back");
            }
        }

        let membership = if self.cache.are_both_cached().await {
            match self.cache.check_ip_in_cached_lists(ip).await {
                Ok(membership) => membership,
                Err(err) => {
                    warn!(%ip, error = %err, "cached list containment failed, querying repository");
                    self.repo.ip_in_both_lists(ip).await?
                }
            }
        } else {
            self.repo.ip_in_both_lists(ip).await?
        };

        if let Err(err) = self.cache.store_ip_verdict(ip, membership).await {
            warn!(%ip, error = %err, "failed to cache subnet verdict");
        }

        Ok(membership)
    }

    /// The durable write has already succeeded when this runs; stale cache
    /// entries merely persist until TTL if any of it fails.
    async fn invalidate_and_rewarm(&self, kind: ListKind, cidr: &str) {
        if let Err(err) = self.cache.invalidate_all().await {
            warn!(list = kind.as_str(), %cidr, error = %err, "failed to invalidate subnet cache");
        }
        if let Err(err) = self.refresh_lists().await {
            warn!(list = kind.as_str(), %cidr, error = %err, "failed to re-warm subnet snapshots");
        }
    }
}

#[async_trait]
impl SubnetLookup for SubnetProvider {
    async fn ip_in_both_lists(&self, ip: IpAddr) -> Result<ListMembership, StorageError> {
        self.lookup(ip).await
    }
}

#[async_trait]
impl SubnetEditor for SubnetProvider {
    async fn add(&self, kind: ListKind, cidr: &str) -> Result<(), StorageError> {
        self.repo.add(kind, cidr).await?;
        self.invalidate_and_rewarm(kind, cidr).await;
        Ok(())
    }

    async fn remove(&self, kind: ListKind, cidr: &str) -> Result<u64, StorageError> {
        let deleted = self.repo.remove(kind, cidr).await?;
        self.invalidate_and_rewarm(kind, cidr).await;
        Ok(deleted)
    }
}
