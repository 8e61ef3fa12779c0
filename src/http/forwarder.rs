//! Upstream forwarding.
//!
//! # Responsibilities
//! - Hold one pooled HTTP client per backend service
//! - Issue exactly one upstream call per inbound request
//! - Classify transport failures into timeout, unreachable and unhandled
//!
//! # Design Decisions
//! - No retries: one attempt bounds tail latency
//! - Clients decode compressed bodies, so relayed bodies are always identity
//!   encoded
//! - Redirects are relayed to the caller, never followed
//! - Dropping the returned future cancels the upstream call

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::observability::metrics;
use crate::routing::ResolvedRoute;
use crate::security::access_control::Identity;
use crate::security::headers;

/// Inbound request parts that travel upstream.
#[derive(Debug, Clone)]
pub struct ProxyEnvelope {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream status, headers and fully read body.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream {service} timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("upstream {service} unreachable: {source}")]
    Unreachable {
        service: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected forwarding failure for {service}: {reason}")]
    Unhandled { service: String, reason: String },
}

impl ForwardError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout { .. } => "timeout",
            ForwardError::Unreachable { .. } => "unreachable",
            ForwardError::Unhandled { .. } => "unhandled",
        }
    }
}

/// Pooled upstream clients keyed by service name.
pub struct Forwarder {
    clients: HashMap<String, reqwest::Client>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(
        services: &[ServiceConfig],
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut clients = HashMap::with_capacity(services.len());
        for service in services {
            let client = reqwest::Client::builder()
                .no_proxy()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(timeout)
                .connect_timeout(connect_timeout)
                .gzip(true)
                .deflate(true)
                .brotli(true)
                .build()?;
            clients.insert(service.name.clone(), client);
        }

        tracing::info!(
            services = clients.len(),
            timeout_secs = timeout.as_secs_f64(),
            "Upstream clients ready"
        );
        Ok(Self { clients, timeout })
    }

    /// Forward `envelope` to the resolved target.
    pub async fn forward(
        &self,
        envelope: ProxyEnvelope,
        route: &ResolvedRoute,
        identity: Option<&Identity>,
    ) -> Result<UpstreamResponse, ForwardError> {
        let ProxyEnvelope {
            method,
            path,
            query,
            headers: mut outbound,
            body,
        } = envelope;

        let Some(client) = self.clients.get(&*route.service) else {
            return Err(self.unhandled(&method, &path, route, "no client for service".into()));
        };

        headers::sanitize_request_headers(&mut outbound);
        if let Some(identity) = identity {
            headers::apply_identity(&mut outbound, identity);
        }

        let url = match &query {
            Some(q) if !q.is_empty() => format!("{}?{}", route.url(), q),
            _ => route.url(),
        };

        tracing::debug!(method = %method, url = %url, service = %route.service, "Forwarding request");
        let start = Instant::now();

        let result = async {
            let response = client
                .request(method.clone(), &url)
                .headers(outbound)
                .body(body)
                .send()
                .await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, body))
        }
        .await;

        match result {
            Ok((status, mut headers, body)) => {
                headers::sanitize_response_headers(&mut headers);
                // Length is recomputed from the relayed body.
                headers.remove(header::CONTENT_LENGTH);
                headers
                    .entry(header::CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));

                tracing::debug!(
                    service = %route.service,
                    status = status.as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                Ok(UpstreamResponse { status, headers, body })
            }
            Err(e) => Err(self.classify(e, &method, &path, route, &url)),
        }
    }

    fn classify(
        &self,
        error: reqwest::Error,
        method: &Method,
        path: &str,
        route: &ResolvedRoute,
        url: &str,
    ) -> ForwardError {
        let service = route.service.to_string();
        let err = if error.is_timeout() {
            tracing::warn!(method = %method, path = %path, url = %url, "Upstream timeout");
            ForwardError::Timeout {
                service,
                timeout: self.timeout,
            }
        } else if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            tracing::warn!(method = %method, path = %path, url = %url, error = %error, "Upstream unreachable");
            ForwardError::Unreachable {
                service,
                source: error,
            }
        } else {
            return self.unhandled(method, path, route, error.to_string());
        };

        metrics::record_upstream_error(err.kind(), &route.service);
        err
    }

    fn unhandled(
        &self,
        method: &Method,
        path: &str,
        route: &ResolvedRoute,
        reason: String,
    ) -> ForwardError {
        tracing::error!(
            method = %method,
            path = %path,
            service = %route.service,
            url = %route.url(),
            reason = %reason,
            "Unhandled gateway error"
        );
        metrics::record_upstream_error("unhandled", &route.service);
        ForwardError::Unhandled {
            service: route.service.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn route(service: &str) -> ResolvedRoute {
        ResolvedRoute {
            service: Arc::from(service),
            // Port 9 on loopback is never served in test environments.
            service_url: Arc::from("http://127.0.0.1:9"),
            target_path: "/api/x/".into(),
        }
    }

    fn envelope() -> ProxyEnvelope {
        ProxyEnvelope {
            method: Method::GET,
            path: "/x/".into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn forwarder() -> Forwarder {
        let services = vec![ServiceConfig::new("crm", "http://127.0.0.1:9", &["/api/crm/"])];
        Forwarder::new(&services, Duration::from_secs(2), Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_service_is_unhandled() {
        let err = forwarder().forward(envelope(), &route("ghost"), None).await.unwrap_err();
        assert_eq!(err.kind(), "unhandled");
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let err = forwarder().forward(envelope(), &route("crm"), None).await.unwrap_err();
        assert_eq!(err.kind(), "unreachable");
    }

    #[test]
    fn test_upstream_response_keeps_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        let response = UpstreamResponse {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(b"a,b"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    }
}
