//! Subnet list management handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use bruteguard_core::ListKind;
use ipnet::IpNet;
use validator::Validate;

use crate::models::{ListQuery, SubnetListResponse, SubnetRequest};
use crate::{ApiError, ApiResult, ApiState};

pub async fn add_to_allowlist(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> ApiResult<StatusCode> {
    add_subnet(&state, ListKind::Allow, request).await
}

pub async fn remove_from_allowlist(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> ApiResult<StatusCode> {
    remove_subnet(&state, ListKind::Allow, request).await
}

pub async fn list_allowlist(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SubnetListResponse>> {
    list_subnets(&state, ListKind::Allow, query).await
}

pub async fn add_to_denylist(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> ApiResult<StatusCode> {
    add_subnet(&state, ListKind::Deny, request).await
}

pub async fn remove_from_denylist(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> ApiResult<StatusCode> {
    remove_subnet(&state, ListKind::Deny, request).await
}

pub async fn list_denylist(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SubnetListResponse>> {
    list_subnets(&state, ListKind::Deny, query).await
}

fn validate_subnet(request: &SubnetRequest) -> ApiResult<()> {
    request
        .validate()
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))?;
    let net: IpNet = request
        .cidr
        .parse()
        .map_err(|_| ApiError::InvalidArgument(format!("invalid CIDR: {:?}", request.cidr)))?;
    // A network with host bits set (`10.0.0.1/24`) is rejected here, not by
    // the store: the boundary owns input validation and the repository's
    // own check must never be the first to fire.
    if net.trunc() != net {
        return Err(ApiError::InvalidArgument(format!("invalid CIDR: {:?}", request.cidr)));
    }
    Ok(())
}

async fn add_subnet(
    state: &ApiState,
    kind: ListKind,
    request: SubnetRequest,
) -> ApiResult<StatusCode> {
    validate_subnet(&request)?;
    state.management.add_subnet(kind, &request.cidr).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_subnet(
    state: &ApiState,
    kind: ListKind,
    request: SubnetRequest,
) -> ApiResult<StatusCode> {
    validate_subnet(&request)?;
    state.management.remove_subnet(kind, &request.cidr).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_subnets(
    state: &ApiState,
    kind: ListKind,
    query: ListQuery,
) -> ApiResult<Json<SubnetListResponse>> {
    let subnets = state.management.list_subnets(kind, query.offset, query.limit).await?;
    Ok(Json(SubnetListResponse { subnets }))
}
