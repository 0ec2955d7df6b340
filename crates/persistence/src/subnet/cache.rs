//! Best-effort subnet cache
//!
//! Two Redis namespaces: `subnets:ip:<addr>` holds per-address verdicts as
//! small JSON blobs, `subnets:list:<type>` holds full list snapshots as
//! sets of CIDR strings. Entries expire after a fixed TTL and the whole
//! cache is dropped wholesale whenever a list is edited. Nothing here is
//! authoritative; every failure degrades to a miss at the call site.

use std::net::IpAddr;
use std::time::Duration;

use bruteguard_core::{ListKind, ListMembership, StorageError};
use ipnet::IpNet;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;

const IP_VERDICT_PREFIX: &str = "subnets:ip:";
const LIST_SNAPSHOT_PREFIX: &str = "subnets:list:";

const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize, Deserialize)]
struct CachedVerdict {
    in_allow: bool,
    in_deny: bool,
}

/// Redis-backed read-through cache for subnet lookups.
pub struct SubnetCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl SubnetCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn, ttl: DEFAULT_TTL }
    }

    fn verdict_key(ip: IpAddr) -> String {
        format!("{IP_VERDICT_PREFIX}{ip}")
    }

    fn snapshot_key(kind: ListKind) -> String {
        format!("{LIST_SNAPSHOT_PREFIX}{}", kind.type_id())
    }

    /// Cached verdict for one address.
    ///
    /// An absent key is a [`StorageError::CacheMiss`]; an undecodable entry
    /// is [`StorageError::UnexpectedDataFormat`] so the caller can log which
    /// key is corrupt before falling back.
    pub async fn ip_verdict(&self, ip: IpAddr) -> Result<ListMembership, StorageError> {
        let key = Self::verdict_key(ip);
        let mut conn = self.conn.clone();

        let data: Option<String> = conn.get(&key).await.map_err(StorageError::unavailable)?;
        let Some(data) = data else {
            return Err(StorageError::CacheMiss);
        };

        let verdict: CachedVerdict = serde_json::from_str(&data)
            .map_err(|err| StorageError::UnexpectedDataFormat { key, source: err.into() })?;

        Ok(ListMembership { in_allow: verdict.in_allow, in_deny: verdict.in_deny })
    }

    /// Store (or replace) the verdict for one address.
    pub async fn store_ip_verdict(
        &self,
        ip: IpAddr,
        membership: ListMembership,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&CachedVerdict {
            in_allow: membership.in_allow,
            in_deny: membership.in_deny,
        })
        .map_err(StorageError::unavailable)?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::verdict_key(ip), payload, self.ttl.as_secs())
            .await
            .map_err(StorageError::unavailable)?;

        Ok(())
    }

    /// Replace both list snapshots in one transaction.
    ///
    /// An empty list leaves its key absent rather than storing an empty set,
    /// so [`are_both_cached`](Self::are_both_cached) stays false until both
    /// lists actually have entries.
    pub async fn set_both_lists(
        &self,
        allow: &[String],
        deny: &[String],
    ) -> Result<(), StorageError> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        for (kind, subnets) in [(ListKind::Allow, allow), (ListKind::Deny, deny)] {
            let key = Self::snapshot_key(kind);
            pipe.del(&key).ignore();
            if !subnets.is_empty() {
                pipe.sadd(&key, subnets).ignore();
                pipe.expire(&key, self.ttl.as_secs() as i64).ignore();
            }
        }

        let mut conn = self.conn.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(StorageError::unavailable)?;
        Ok(())
    }

    /// Cheap existence probe used before attempting local containment.
    pub async fn are_both_cached(&self) -> bool {
        let mut conn = self.conn.clone();
        let count: i64 = match redis::cmd("EXISTS")
            .arg(Self::snapshot_key(ListKind::Allow))
            .arg(Self::snapshot_key(ListKind::Deny))
            .query_async(&mut conn)
            .await
        {
            Ok(count) => count,
            Err(_) => return false,
        };

        count == 2
    }

    /// Both snapshots in one round-trip.
    pub async fn get_both_lists(&self) -> Result<(Vec<String>, Vec<String>), StorageError> {
        let mut pipe = redis::pipe();
        pipe.smembers(Self::snapshot_key(ListKind::Allow));
        pipe.smembers(Self::snapshot_key(ListKind::Deny));

        let mut conn = self.conn.clone();
        let (allow, deny): (Vec<String>, Vec<String>) = pipe
            .query_async(&mut conn)
            .await
            .map_err(StorageError::unavailable)?;

        Ok((allow, deny))
    }

    /// Containment test against the cached snapshots, without touching the
    /// authoritative store.
    pub async fn check_ip_in_cached_lists(
        &self,
        ip: IpAddr,
    ) -> Result<ListMembership, StorageError> {
        let (allow, deny) = self.get_both_lists().await?;

        Ok(ListMembership {
            in_allow: ip_in_any(ip, &allow, ListKind::Allow),
            in_deny: ip_in_any(ip, &deny, ListKind::Deny),
        })
    }

    /// Drop every key under both cache namespaces.
    pub async fn invalidate_all(&self) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();

        let mut keys: Vec<String> = conn
            .keys(format!("{IP_VERDICT_PREFIX}*"))
            .await
            .map_err(StorageError::unavailable)?;
        let snapshot_keys: Vec<String> = conn
            .keys(format!("{LIST_SNAPSHOT_PREFIX}*"))
            .await
            .map_err(StorageError::unavailable)?;
        keys.extend(snapshot_keys);

        if keys.is_empty() {
            return Ok(());
        }

        let _: i64 = conn.del(keys).await.map_err(StorageError::unavailable)?;
        Ok(())
    }
}

/// True when any snapshot entry contains the address. Malformed entries are
/// skipped with a warning; the authoritative store is the backstop, so a
/// corrupt cache line must never fail the lookup.
fn ip_in_any(ip: IpAddr, subnets: &[String], kind: ListKind) -> bool {
    subnets.iter().any(|cidr| match cidr.parse::<IpNet>() {
        Ok(net) => net.contains(&ip),
        Err(err) => {
            warn!(%cidr, list = kind.as_str(), error = %err, "skipping malformed CIDR in cache");
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nets(cidrs: &[&str]) -> Vec<String> {
        cidrs.iter().map(|cidr| cidr.to_string()).collect()
    }

    #[test]
    fn contained_address_matches() {
        let subnets = nets(&["192.168.0.0/16", "10.0.0.0/24"]);
        let ip: IpAddr = "10.0.0.77".parse().unwrap();

        assert!(ip_in_any(ip, &subnets, ListKind::Allow));
    }

    #[test]
    fn host_entry_matches_its_own_address() {
        let subnets = nets(&["10.0.0.1/32"]);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(ip_in_any(ip, &subnets, ListKind::Allow));
    }

    #[test]
    fn outside_address_does_not_match() {
        let subnets = nets(&["10.0.0.0/24"]);
        let ip: IpAddr = "10.0.1.1".parse().unwrap();

        assert!(!ip_in_any(ip, &subnets, ListKind::Deny));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let subnets = nets(&["garbage", "10.0.0.0/8"]);
        let ip: IpAddr = "10.1.2.3".parse().unwrap();

        assert!(ip_in_any(ip, &subnets, ListKind::Deny));
        assert!(!ip_in_any("172.16.0.1".parse().unwrap(), &subnets, ListKind::Deny));
    }

    #[test]
    fn address_families_do_not_mix() {
        let v4: IpAddr = "10.0.0.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(!ip_in_any(v4, &nets(&["2001:db8::/32"]), ListKind::Allow));
        assert!(!ip_in_any(v6, &nets(&["10.0.0.0/8"]), ListKind::Allow));
        assert!(ip_in_any(v6, &nets(&["2001:db8::/32"]), ListKind::Allow));
    }

    #[test]
    fn cache_keys_carry_their_namespace() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(SubnetCache::verdict_key(ip), "subnets:ip:10.0.0.1");
        assert_eq!(SubnetCache::snapshot_key(ListKind::Allow), "subnets:list:1");
        assert_eq!(SubnetCache::snapshot_key(ListKind::Deny), "subnets:list:2");
    }
}
