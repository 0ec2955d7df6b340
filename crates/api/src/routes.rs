//! Router assembly

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, ApiState};

/// Per-request deadline; when it expires the handler future is dropped and
/// any in-flight store call is cancelled with it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the router for both service surfaces.
pub fn build_routes(state: ApiState) -> Router {
    let check_routes = Router::new().route("/check-access", post(handlers::check::check_access));

    let management_routes = Router::new()
        .route("/allowlist", get(handlers::subnets::list_allowlist))
        .route("/allowlist/add", post(handlers::subnets::add_to_allowlist))
        .route("/allowlist/remove", post(handlers::subnets::remove_from_allowlist))
        .route("/denylist", get(handlers::subnets::list_denylist))
        .route("/denylist/add", post(handlers::subnets::add_to_denylist))
        .route("/denylist/remove", post(handlers::subnets::remove_from_denylist))
        .route("/buckets/reset-by-ip", post(handlers::buckets::reset_by_ip))
        .route("/buckets/reset-by-login", post(handlers::buckets::reset_by_login))
        .route("/buckets/reset-by-password", post(handlers::buckets::reset_by_password));

    Router::new()
        .route("/ping", get(handlers::check::ping))
        .nest("/api/v1", check_routes.merge(management_routes))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
