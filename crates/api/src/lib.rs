//! HTTP/JSON boundary for the anti-bruteforce arbiter.
//!
//! Two logical surfaces share one router: the check surface consulted by
//! authentication frontends (`/ping`, `/api/v1/check-access`) and the
//! management surface for operators (list edits, bucket resets). The
//! boundary validates every input before it reaches the decision core and
//! maps internal error kinds onto the HTTP taxonomy.

pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;

pub use error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use bruteguard_core::{AccessService, ManagementService};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub access: Arc<AccessService>,
    pub management: Arc<ManagementService>,
}

impl ApiState {
    pub fn new(access: Arc<AccessService>, management: Arc<ManagementService>) -> Self {
        Self { access, management }
    }
}

/// Build the complete router.
pub fn build_router(state: ApiState) -> Router {
    routes::build_routes(state)
}
