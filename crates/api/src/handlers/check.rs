//! Check-surface handlers

use std::net::IpAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;
use validator::Validate;

use crate::models::{CheckAccessRequest, CheckAccessResponse};
use crate::{ApiError, ApiResult, ApiState};

/// Liveness probe.
pub async fn ping() -> StatusCode {
    StatusCode::OK
}

/// Arbitrate one credential attempt.
///
/// The address is parsed before anything else runs; a request with a bad IP
/// never reaches the subnet store or the counters.
pub async fn check_access(
    State(state): State<ApiState>,
    Json(request): Json<CheckAccessRequest>,
) -> ApiResult<Json<CheckAccessResponse>> {
    request
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;

    let ip: IpAddr = request
        .ip
        .parse()
        .map_err(|_| ApiError::InvalidArgument(format!("invalid IP address: {:?}", request.ip)))?;

    let verdict = state.access.decide(&request.login, &request.password, ip).await?;

    debug!(%ip, login = %request.login, allowed = verdict.is_allowed(), "access checked");

    Ok(Json(verdict.into()))
}
