//! Admin endpoints, mounted under `/admin` when enabled.
//!
//! - `GET /admin/status`: version and status
//! - `GET /admin/routes`: resolver table sizes and hit counters
//! - `GET /admin/resolve?path=...`: dry-run resolution

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::AdminConfig;
use crate::http::server::AppState;

pub fn routes(config: &AdminConfig) -> Router<AppState> {
    let api_key: Arc<str> = Arc::from(config.api_key.as_str());
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/resolve", get(get_resolve))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
}
