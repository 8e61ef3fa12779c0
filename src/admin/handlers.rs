use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::routing::{ResolverStats, ResolvedRoute};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: state.version.to_string(),
        status: "operational",
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<ResolverStats> {
    Json(state.resolver.stats())
}

/// Dry-run resolution. Goes through the resolver, so it warms the memo
/// cache like real traffic would.
pub async fn get_resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    match state.resolver.resolve(&query.path) {
        Ok(route) => Json::<ResolvedRoute>(route).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": e.to_string() })),
        )
            .into_response(),
    }
}
