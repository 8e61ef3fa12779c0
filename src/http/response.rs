//! Gateway error responses.
//!
//! # Responsibilities
//! - Unify request-path failures in one error type
//! - Map each failure to its HTTP status and a `{"detail": ...}` body
//!
//! # Design Decisions
//! - Every 401 carries a `WWW-Authenticate: Bearer` challenge
//! - Upstream timeouts result in 504, unreachable upstreams in 503
//! - Internal details stay in the logs, never in 500 bodies

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::http::forwarder::ForwardError;
use crate::routing::RouteNotFound;
use crate::security::AuthError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    RouteNotFound(#[from] RouteNotFound),

    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    #[error("Service timeout")]
    UpstreamTimeout,

    #[error("Service unavailable")]
    UpstreamUnreachable,

    #[error("Internal gateway error")]
    Unhandled,

    #[error("{0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<ForwardError> for GatewayError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Timeout { .. } => GatewayError::UpstreamTimeout,
            ForwardError::Unreachable { .. } => GatewayError::UpstreamUnreachable,
            ForwardError::Unhandled { .. } => GatewayError::Unhandled,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "detail": self.to_string() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
