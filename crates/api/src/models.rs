//! Request and response payloads

use bruteguard_core::AccessVerdict;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One credential attempt to arbitrate.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckAccessRequest {
    #[validate(length(min = 1))]
    pub login: String,

    #[validate(length(min = 1))]
    pub password: String,

    pub ip: String,
}

/// The verdict returned to the authentication frontend.
#[derive(Debug, Serialize)]
pub struct CheckAccessResponse {
    pub allowed: bool,
    pub reason: DenialReason,
}

/// Why an attempt was denied; `UNSPECIFIED` when it was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    Unspecified,
    IpDenyList,
    TooManyRequestsIp,
    TooManyRequestsLogin,
    TooManyRequestsPassword,
}

impl From<AccessVerdict> for CheckAccessResponse {
    fn from(verdict: AccessVerdict) -> Self {
        let reason = match verdict {
            AccessVerdict::Allowed => DenialReason::Unspecified,
            AccessVerdict::DeniedIpDenyList => DenialReason::IpDenyList,
            AccessVerdict::DeniedRateLimitIp => DenialReason::TooManyRequestsIp,
            AccessVerdict::DeniedRateLimitLogin => DenialReason::TooManyRequestsLogin,
            AccessVerdict::DeniedRateLimitPassword => DenialReason::TooManyRequestsPassword,
        };

        CheckAccessResponse { allowed: verdict.is_allowed(), reason }
    }
}

/// A subnet to add to or remove from a list.
#[derive(Debug, Deserialize, Validate)]
pub struct SubnetRequest {
    #[validate(length(min = 1))]
    pub cidr: String,
}

/// Pagination window for list queries.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

/// One page of a subnet list.
#[derive(Debug, Serialize)]
pub struct SubnetListResponse {
    pub subnets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetByIpRequest {
    pub ip: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetByLoginRequest {
    #[validate(length(min = 1))]
    pub login: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetByPasswordRequest {
    #[validate(length(min = 1))]
    pub password: String,
}

/// Result of a bucket reset; `was_done` reports whether a window existed.
#[derive(Debug, Serialize)]
pub struct ResetBucketResponse {
    pub was_done: bool,
}
