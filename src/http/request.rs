//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the client sent none
//! - Echo the request ID on the response
//! - Buffer the inbound request into a [`ProxyEnvelope`] for forwarding
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID travels upstream with the other inbound headers
//! - Body size is capped by the body-limit layer before buffering

use std::error::Error as StdError;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use uuid::Uuid;

use crate::http::forwarder::ProxyEnvelope;
use crate::http::response::GatewayError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Layer that assigns `x-request-id` to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuidV4> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4)
}

/// Layer that copies `x-request-id` from the request onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Request ID of an inbound request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

impl ProxyEnvelope {
    /// Buffer an inbound request. `limit` bounds the body size.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, GatewayError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if exceeds_limit(&e) {
                tracing::warn!(path = %parts.uri.path(), limit, "Request body over limit");
                return GatewayError::PayloadTooLarge;
            }
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            GatewayError::BadRequest("Unable to read request body".to_string())
        })?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }
}

/// Whether a body read failed on a length limit. The limit error may sit
/// several layers down, depending on which limiter tripped first.
fn exceeds_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
