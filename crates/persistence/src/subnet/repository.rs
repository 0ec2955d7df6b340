//! Authoritative subnet repository
//!
//! The `subnets` table keys entries by `(list_type, subnet)`; containment
//! checks run on Postgres' native `inet`/`cidr` operators so an address is
//! matched against both lists in one round-trip. CIDR parameters are bound
//! as text and cast inside the query.

use std::net::IpAddr;

use async_trait::async_trait;
use bruteguard_core::{ListKind, ListMembership, StorageError, SubnetLister};
use ipnet::IpNet;
use sqlx::PgPool;

/// Postgres-backed store of the allow and deny lists.
#[derive(Clone)]
pub struct SubnetRepository {
    pool: PgPool,
}

impl SubnetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reject anything that is not a canonical network: unparseable text and
    /// networks with host bits set (the store would refuse them anyway, but
    /// as an opaque database error instead of a client error).
    fn validate_cidr(cidr: &str) -> Result<(), StorageError> {
        let net: IpNet = cidr
            .parse()
            .map_err(|_| StorageError::InvalidCidr(cidr.to_string()))?;
        if net.trunc() != net {
            return Err(StorageError::InvalidCidr(cidr.to_string()));
        }
        Ok(())
    }

    /// Idempotent insert; a duplicate `(kind, cidr)` pair is a no-op.
    pub async fn add(&self, kind: ListKind, cidr: &str) -> Result<(), StorageError> {
        Self::validate_cidr(cidr)?;

        sqlx::query(
            "INSERT INTO subnets (list_type, subnet) VALUES ($1, $2::text::cidr) \
             ON CONFLICT (list_type, subnet) DO NOTHING",
        )
        .bind(kind.type_id())
        .bind(cidr)
        .execute(&self.pool)
        .await
        .map_err(StorageError::unavailable)?;

        Ok(())
    }

    /// Returns the number of deleted rows (0 when the entry was absent).
    pub async fn remove(&self, kind: ListKind, cidr: &str) -> Result<u64, StorageError> {
        Self::validate_cidr(cidr)?;

        let result = sqlx::query(
            "DELETE FROM subnets WHERE list_type = $1 AND subnet = $2::text::cidr",
        )
        .bind(kind.type_id())
        .bind(cidr)
        .execute(&self.pool)
        .await
        .map_err(StorageError::unavailable)?;

        Ok(result.rows_affected())
    }

    /// One page of a list in Postgres network order.
    pub async fn list(
        &self,
        kind: ListKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, StorageError> {
        sqlx::query_scalar(
            "SELECT subnet::text FROM subnets WHERE list_type = $1 \
             ORDER BY subnet OFFSET $2 LIMIT $3",
        )
        .bind(kind.type_id())
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::unavailable)
    }

    /// Both complete lists in a single query.
    pub async fn get_both_lists(&self) -> Result<(Vec<String>, Vec<String>), StorageError> {
        let rows: Vec<(i16, String)> = sqlx::query_as(
            "SELECT list_type, subnet::text FROM subnets WHERE list_type IN ($1, $2) \
             ORDER BY list_type, subnet",
        )
        .bind(ListKind::Allow.type_id())
        .bind(ListKind::Deny.type_id())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::unavailable)?;

        let mut allow = Vec::new();
        let mut deny = Vec::new();
        for (list_type, cidr) in rows {
            if list_type == ListKind::Allow.type_id() {
                allow.push(cidr);
            } else {
                deny.push(cidr);
            }
        }

        Ok((allow, deny))
    }

    /// Containment test against both lists in one round-trip.
    ///
    /// `>>=` matches containment or equality, so a host entry (`/32`,
    /// `/128`) matches its own address. Cross-family comparisons are false;
    /// IPv4 is never looked up inside an IPv6 network or vice versa.
    pub async fn ip_in_both_lists(&self, ip: IpAddr) -> Result<ListMembership, StorageError> {
        let (in_allow, in_deny): (bool, bool) = sqlx::query_as(
            "SELECT \
               EXISTS(SELECT 1 FROM subnets WHERE list_type = $1 AND subnet >>= $3::text::inet), \
               EXISTS(SELECT 1 FROM subnets WHERE list_type = $2 AND subnet >>= $3::text::inet)",
        )
        .bind(ListKind::Allow.type_id())
        .bind(ListKind::Deny.type_id())
        .bind(ip.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::unavailable)?;

        Ok(ListMembership { in_allow, in_deny })
    }
}

#[async_trait]
impl SubnetLister for SubnetRepository {
    async fn list(
        &self,
        kind: ListKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, StorageError> {
        SubnetRepository::list(self, kind, offset, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_networks_pass_validation() {
        for cidr in ["10.0.0.0/8", "192.168.1.0/24", "10.0.0.1/32", "2001:db8::/32", "::1/128"] {
            assert!(SubnetRepository::validate_cidr(cidr).is_ok(), "{cidr}");
        }
    }

    #[test]
    fn malformed_or_noncanonical_cidrs_are_rejected() {
        for cidr in ["", "10.0.0.1", "10.0.0.0/33", "not-a-net", "10.0.0.1/24"] {
            let err = SubnetRepository::validate_cidr(cidr).unwrap_err();
            assert!(matches!(err, StorageError::InvalidCidr(_)), "{cidr}");
        }
    }
}
