//! Rate-limit bucket reset handlers

use std::net::IpAddr;

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::models::{
    ResetBucketResponse, ResetByIpRequest, ResetByLoginRequest, ResetByPasswordRequest,
};
use crate::{ApiError, ApiResult, ApiState};

pub async fn reset_by_ip(
    State(state): State<ApiState>,
    Json(request): Json<ResetByIpRequest>,
) -> ApiResult<Json<ResetBucketResponse>> {
    // Buckets are keyed by the canonical textual form of the parsed
    // address; resetting through the raw input would miss the bucket for
    // any non-canonical spelling (`2001:DB8::1`, `0:0:0:0:0:0:0:1`).
    let ip: IpAddr = request
        .ip
        .parse()
        .map_err(|_| ApiError::InvalidArgument(format!("invalid IP address: {:?}", request.ip)))?;

    let was_done = state.management.reset_bucket_by_ip(&ip.to_string()).await?;
    Ok(Json(ResetBucketResponse { was_done }))
}

pub async fn reset_by_login(
    State(state): State<ApiState>,
    Json(request): Json<ResetByLoginRequest>,
) -> ApiResult<Json<ResetBucketResponse>> {
    request
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;

    let was_done = state.management.reset_bucket_by_login(&request.login).await?;
    Ok(Json(ResetBucketResponse { was_done }))
}

pub async fn reset_by_password(
    State(state): State<ApiState>,
    Json(request): Json<ResetByPasswordRequest>,
) -> ApiResult<Json<ResetBucketResponse>> {
    request
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;

    let was_done = state.management.reset_bucket_by_password(&request.password).await?;
    Ok(Json(ResetBucketResponse { was_done }))
}
