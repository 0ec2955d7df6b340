//! Access decider
//!
//! Composes the subnet lists and the sliding-window counters into a single
//! verdict. The subnet lookup always runs first so allow-listed addresses
//! never consume rate-limit budget.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ServiceError, StorageError};
use crate::types::{AttemptCounts, AttemptKeys, ListMembership};

/// Capability: membership of an address in the allow and deny lists.
#[async_trait]
pub trait SubnetLookup: Send + Sync {
    async fn ip_in_both_lists(&self, ip: IpAddr) -> Result<ListMembership, StorageError>;
}

/// Capability: tally and record one attempt across all three dimensions.
///
/// The returned counts are the window cardinalities *before* the attempt was
/// recorded; the attempt itself is always recorded, including when the
/// verdict ends up a denial.
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    async fn count_and_record(&self, keys: &AttemptKeys) -> Result<AttemptCounts, StorageError>;
}

/// Per-dimension attempt thresholds.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub ip: i64,
    pub login: i64,
    pub password: i64,
}

/// Outcome of a single access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    Allowed,
    DeniedIpDenyList,
    DeniedRateLimitIp,
    DeniedRateLimitLogin,
    DeniedRateLimitPassword,
}

impl AccessVerdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, AccessVerdict::Allowed)
    }
}

/// The access decider.
pub struct AccessService {
    subnets: Arc<dyn SubnetLookup>,
    counters: Arc<dyn AttemptRecorder>,
    limits: RateLimits,
}

impl AccessService {
    pub fn new(
        subnets: Arc<dyn SubnetLookup>,
        counters: Arc<dyn AttemptRecorder>,
        limits: RateLimits,
    ) -> Self {
        Self { subnets, counters, limits }
    }

    /// Decide whether an attempt with the given credentials may proceed.
    ///
    /// Denial reasons are prioritised: deny-list membership beats any rate
    /// limit, and within the rate limits IP beats login beats password. The
    /// comparison is `count >= limit`, so with limit `L` the first `L`
    /// attempts in a window pass and the `L+1`-th is the first denied.
    pub async fn decide(
        &self,
        login: &str,
        password: &str,
        ip: IpAddr,
    ) -> Result<AccessVerdict, ServiceError> {
        let membership = self.subnets.ip_in_both_lists(ip).await?;

        if membership.in_allow {
            return Ok(AccessVerdict::Allowed);
        }
        if membership.in_deny {
            return Ok(AccessVerdict::DeniedIpDenyList);
        }

        let keys = AttemptKeys {
            ip: ip.to_string(),
            login: login.to_owned(),
            password: password.to_owned(),
        };
        let counts = self.counters.count_and_record(&keys).await?;

        let verdict = if counts.ip >= self.limits.ip {
            AccessVerdict::DeniedRateLimitIp
        } else if counts.login >= self.limits.login {
            AccessVerdict::DeniedRateLimitLogin
        } else if counts.password >= self.limits.password {
            AccessVerdict::DeniedRateLimitPassword
        } else {
            AccessVerdict::Allowed
        };

        debug!(
            %ip,
            ip_count = counts.ip,
            login_count = counts.login,
            password_count = counts.password,
            verdict = ?verdict,
            "access decision"
        );

        Ok(verdict)
    }
}
